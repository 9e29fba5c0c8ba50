//! The outermost loop: snapshot, project, plan, actuate, sleep. One
//! iteration finishes before the next begins, and nothing survives an
//! iteration except the configuration.

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, instrument, warn};

use crate::actuator::Actuator;
use crate::cluster::{self, ClusterApi};
use crate::config::Config;
use crate::demand;
use crate::fleet::{self, FleetApi};
use crate::planner;

pub struct Manager<C, F> {
    config: Config,
    cluster: C,
    fleets: F,
    live: bool,
}

impl<C: ClusterApi, F: FleetApi> Manager<C, F> {
    pub fn new(config: Config, cluster: C, fleets: F, live: bool) -> Self {
        Manager {
            config,
            cluster,
            fleets,
            live,
        }
    }

    /// Reconciles until interrupted or terminated. The loop is the sole
    /// error boundary: a failed tick is logged and the cadence continues.
    /// A signal lets the in-flight iteration finish before exiting.
    pub async fn run(&self) -> Result<()> {
        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        info!(
            live = self.live,
            sectors = self.config.sectors.len(),
            interval_s = self.config.sleep_interval.as_secs(),
            "fleet manager started"
        );
        loop {
            if let Err(err) = self.tick().await {
                warn!(error = format!("{err:#}"), "tick skipped");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.sleep_interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received; shutting down");
                    return Ok(());
                }
                _ = terminate.recv() => {
                    info!("termination requested; shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// One tick behind the same error boundary as `run`: a failed tick is
    /// logged and the process still exits cleanly.
    pub async fn run_once(&self) -> Result<()> {
        if let Err(err) = self.tick().await {
            warn!(error = format!("{err:#}"), "tick skipped");
        }
        Ok(())
    }

    /// One full reconciliation. A cluster read failure aborts the tick
    /// before any decision is made; fleet read failures only narrow it.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> Result<()> {
        let snapshot = cluster::take_snapshot(&self.cluster, &self.config).await?;
        let fleets = fleet::observe_fleets(&self.fleets, &self.config).await;
        let demand = demand::project(&self.config, &snapshot.pods);
        for (sector, sector_demand) in &demand {
            debug!(
                sector = %sector,
                cpu = %sector_demand.cpu,
                memory = %sector_demand.memory,
                pods = sector_demand.pods.len(),
                "sector demand"
            );
        }
        let plans = planner::plan(&self.config, &snapshot.nodes, &demand, &fleets);
        let actuator = Actuator::new(
            &self.cluster,
            &self.fleets,
            self.live,
            self.config.request_timeout,
        );
        let changed = actuator.apply(&plans).await;
        info!(
            nodes = snapshot.nodes.len(),
            pods = snapshot.pods.len(),
            fleets = fleets.len(),
            planned = plans.len(),
            changed,
            "tick complete"
        );
        Ok(())
    }
}
