//! Reads and writes the cloud side of the world: the EC2 fleets backing
//! each `(sector, size)` tier. Fleets are created by the infrastructure
//! layer and discovered here by tag selector, never by stored id.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::types::{Filter, FleetData, FleetStateCode, TargetCapacitySpecificationRequest};
use tracing::{debug, instrument, warn};

use crate::catalog::Size;
use crate::config::Config;

/// `(sector, size)`: the in-cluster identity of a managed fleet.
pub type FleetKey = (String, Size);

/// Tag selector identifying one fleet among everything the account runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSelector {
    pub cluster: String,
    pub sector: String,
    pub size: Size,
}

impl fmt::Display for FleetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cluster={} sector={} size={}",
            self.cluster, self.sector, self.size
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetObservation {
    pub fleet_id: String,
    pub target_capacity: u32,
    pub instance_ids: Vec<String>,
}

#[async_trait]
pub trait FleetApi: Send + Sync {
    /// Resolves the selector to exactly one live fleet and reads its state.
    async fn find_fleet(&self, selector: &FleetSelector) -> Result<FleetObservation>;
    async fn set_target_capacity(&self, fleet_id: &str, target: u32) -> Result<()>;
}

/// Production implementation over the EC2 API.
pub struct Ec2Fleets {
    client: aws_sdk_ec2::Client,
}

impl Ec2Fleets {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Ec2Fleets { client }
    }

    pub async fn from_env() -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Ec2Fleets::new(aws_sdk_ec2::Client::new(&shared))
    }
}

fn tag_filter(key: &str, value: &str) -> Filter {
    Filter::builder()
        .name(format!("tag:{key}"))
        .values(value)
        .build()
}

fn is_live(fleet: &FleetData) -> bool {
    matches!(
        fleet.fleet_state(),
        Some(FleetStateCode::Active) | Some(FleetStateCode::Modifying)
    )
}

#[async_trait]
impl FleetApi for Ec2Fleets {
    async fn find_fleet(&self, selector: &FleetSelector) -> Result<FleetObservation> {
        let described = self
            .client
            .describe_fleets()
            .filters(tag_filter("cluster", &selector.cluster))
            .filters(tag_filter("sector", &selector.sector))
            .filters(tag_filter("size", selector.size.as_str()))
            .send()
            .await
            .with_context(|| format!("DescribeFleets failed for {selector}"))?;
        let live: Vec<&FleetData> = described
            .fleets()
            .iter()
            .filter(|fleet| is_live(fleet))
            .collect();
        let fleet = match live.as_slice() {
            [one] => *one,
            [] => return Err(anyhow!("no live fleet matches {selector}")),
            many => {
                return Err(anyhow!(
                    "{} live fleets match {selector}; refusing to pick one",
                    many.len()
                ))
            }
        };
        let fleet_id = fleet
            .fleet_id()
            .ok_or_else(|| anyhow!("fleet matching {selector} has no id"))?
            .to_string();
        let target_capacity = fleet
            .target_capacity_specification()
            .and_then(|t| t.total_target_capacity())
            .and_then(|t| u32::try_from(t).ok())
            .unwrap_or(0);

        let instances = self
            .client
            .describe_fleet_instances()
            .fleet_id(fleet_id.as_str())
            .send()
            .await
            .with_context(|| format!("DescribeFleetInstances failed for fleet {fleet_id}"))?;
        let instance_ids = instances
            .active_instances()
            .iter()
            .filter_map(|instance| instance.instance_id().map(str::to_string))
            .collect();

        Ok(FleetObservation {
            fleet_id,
            target_capacity,
            instance_ids,
        })
    }

    async fn set_target_capacity(&self, fleet_id: &str, target: u32) -> Result<()> {
        let spec = TargetCapacitySpecificationRequest::builder()
            .total_target_capacity(target as i32)
            .build();
        self.client
            .modify_fleet()
            .fleet_id(fleet_id)
            .target_capacity_specification(spec)
            .send()
            .await
            .with_context(|| format!("ModifyFleet failed for fleet {fleet_id}"))?;
        Ok(())
    }
}

/// Reads every configured fleet, concurrently. A fleet that cannot be read
/// is logged and left out of the returned map; the rest of the tick
/// proceeds without it.
#[instrument(skip(api, config))]
pub async fn observe_fleets<F: FleetApi + ?Sized>(
    api: &F,
    config: &Config,
) -> BTreeMap<FleetKey, FleetObservation> {
    let lookups = config.fleet_specs().map(|spec| {
        let selector = FleetSelector {
            cluster: config.cluster_name.clone(),
            sector: spec.sector.clone(),
            size: spec.size,
        };
        let timeout = config.request_timeout;
        async move {
            let outcome = tokio::time::timeout(timeout, api.find_fleet(&selector)).await;
            (spec, outcome)
        }
    });

    let mut fleets = BTreeMap::new();
    for (spec, outcome) in futures::future::join_all(lookups).await {
        match outcome {
            Ok(Ok(observation)) => {
                debug!(
                    fleet = %spec.name(),
                    fleet_id = %observation.fleet_id,
                    target = observation.target_capacity,
                    instances = observation.instance_ids.len(),
                    "observed fleet"
                );
                fleets.insert((spec.sector.clone(), spec.size), observation);
            }
            Ok(Err(err)) => warn!(
                fleet = %spec.name(),
                error = format!("{err:#}"),
                "fleet read failed; fleet excluded from this tick"
            ),
            Err(_) => warn!(
                fleet = %spec.name(),
                "fleet read timed out; fleet excluded from this tick"
            ),
        }
    }
    fleets
}
