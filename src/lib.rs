pub mod actuator;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod control;
pub mod demand;
pub mod fleet;
pub mod planner;
pub mod qty;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::instrument;

use crate::cluster::KubeCluster;
use crate::config::Config;
use crate::control::Manager;
use crate::fleet::Ec2Fleets;

#[derive(Parser, Debug)]
#[clap(about, version)]
pub struct CliOpts {
    /// Apply decisions. Without this flag every write is logged and skipped.
    #[clap(long)]
    pub live: bool,

    /// Path of the configuration file
    #[clap(long, default_value = "/etc/fleet-manager/config.yaml")]
    pub config: PathBuf,

    /// The name of the kubeconfig context to use
    #[clap(long)]
    pub context: Option<String>,

    /// Run a single reconciliation and exit
    #[clap(long)]
    pub once: bool,
}

pub async fn new_kube_client(context: &Option<String>) -> Result<kube::Client> {
    let client_config = match context {
        Some(context) => {
            kube::Config::from_kubeconfig(&kube::config::KubeConfigOptions {
                context: Some(context.clone()),
                ..Default::default()
            })
            .await?
        }
        None => kube::Config::infer().await?,
    };
    kube::Client::try_from(client_config)
        .with_context(|| "failed to create the kube client".to_string())
}

#[instrument]
pub async fn do_main(cli_opts: &CliOpts) -> Result<()> {
    let config = Config::load(&cli_opts.config)?;
    let client = new_kube_client(&cli_opts.context).await?;
    let fleets = Ec2Fleets::from_env().await;
    let manager = Manager::new(config, KubeCluster::new(client), fleets, cli_opts.live);
    if cli_opts.once {
        manager.run_once().await
    } else {
        manager.run().await
    }
}
