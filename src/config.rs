//! Typed configuration, loaded once at startup. The file is YAML; the raw
//! serde shapes are validated into `Config` so the rest of the process never
//! sees a malformed sector or quantity.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::catalog::{Kind, Size};
use crate::qty::{CpuQty, InvalidQuantity, MemQty};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{key}: {source}")]
    Quantity {
        key: &'static str,
        #[source]
        source: InvalidQuantity,
    },
    #[error("sleep_interval must be at least 1 second")]
    SleepInterval,
    #[error("default_over_subscription must be a non-negative finite number")]
    OverSubscription,
    #[error("sector {sector:?} declares no fleets")]
    EmptySector { sector: String },
    #[error("sector {sector:?} declares size {size} more than once")]
    DuplicateSize { sector: String, size: Size },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    cluster_name: String,
    sleep_interval: u64,
    #[serde(default)]
    request_timeout: Option<u64>,
    default_over_subscription: f64,
    reserved_cpus: String,
    reserved_memory: String,
    sectors: BTreeMap<String, RawSector>,
}

#[derive(Debug, Deserialize)]
struct RawSector {
    kind: Kind,
    fleets: Vec<RawFleet>,
}

#[derive(Debug, Deserialize)]
struct RawFleet {
    size: Size,
    min_capacity: u32,
}

/// One managed fleet: the `(sector, size, kind)` key plus its floor.
/// The underlying EC2 fleet is located at runtime by tag selector
/// (`cluster`, `sector`, `size`), so no cloud id is stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSpec {
    pub sector: String,
    pub size: Size,
    pub kind: Kind,
    pub min_capacity: u32,
}

impl FleetSpec {
    /// Stable human-readable handle used in log entries.
    pub fn name(&self) -> String {
        format!("{}/{}", self.sector, self.size)
    }
}

#[derive(Debug, Clone)]
pub struct Sector {
    pub name: String,
    pub kind: Kind,
    /// Ascending by size; sizes are unique within the sector.
    pub fleets: Vec<FleetSpec>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cluster_name: String,
    pub sleep_interval: Duration,
    pub request_timeout: Duration,
    /// `default_over_subscription` held exactly, in basis points.
    pub over_subscription_bps: u32,
    pub reserved_cpus: CpuQty,
    pub reserved_memory: MemQty,
    pub sectors: BTreeMap<String, Sector>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let raw: RawConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        Config::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Config, ConfigError> {
        if raw.sleep_interval < 1 {
            return Err(ConfigError::SleepInterval);
        }
        if !raw.default_over_subscription.is_finite() || raw.default_over_subscription < 0.0 {
            return Err(ConfigError::OverSubscription);
        }
        let over_subscription_bps = (raw.default_over_subscription * 10_000.0).round() as u32;
        let reserved_cpus =
            CpuQty::from_str(&raw.reserved_cpus).map_err(|source| ConfigError::Quantity {
                key: "reserved_cpus",
                source,
            })?;
        let reserved_memory =
            MemQty::from_str(&raw.reserved_memory).map_err(|source| ConfigError::Quantity {
                key: "reserved_memory",
                source,
            })?;

        let mut sectors = BTreeMap::new();
        for (name, raw_sector) in raw.sectors {
            if raw_sector.fleets.is_empty() {
                return Err(ConfigError::EmptySector { sector: name });
            }
            let mut fleets: Vec<FleetSpec> = Vec::with_capacity(raw_sector.fleets.len());
            for fleet in &raw_sector.fleets {
                if fleets.iter().any(|f| f.size == fleet.size) {
                    return Err(ConfigError::DuplicateSize {
                        sector: name,
                        size: fleet.size,
                    });
                }
                fleets.push(FleetSpec {
                    sector: name.clone(),
                    size: fleet.size,
                    kind: raw_sector.kind,
                    min_capacity: fleet.min_capacity,
                });
            }
            fleets.sort_by_key(|f| f.size);
            sectors.insert(
                name.clone(),
                Sector {
                    name,
                    kind: raw_sector.kind,
                    fleets,
                },
            );
        }

        let sleep_interval = Duration::from_secs(raw.sleep_interval);
        let request_timeout = raw
            .request_timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout >= sleep_interval {
            warn!(
                request_timeout_s = request_timeout.as_secs(),
                sleep_interval_s = sleep_interval.as_secs(),
                "request_timeout is not shorter than sleep_interval; slow API calls will overlap the cadence"
            );
        }

        Ok(Config {
            cluster_name: raw.cluster_name,
            sleep_interval,
            request_timeout,
            over_subscription_bps,
            reserved_cpus,
            reserved_memory,
            sectors,
        })
    }

    /// Every managed fleet, in `(sector, size)` order.
    pub fn fleet_specs(&self) -> impl Iterator<Item = &FleetSpec> {
        self.sectors.values().flat_map(|s| s.fleets.iter())
    }
}
