//! Projects pod resource demand onto sectors. A pod is steered to a sector
//! by its `sector` node-selector entry; everything else in the cluster is
//! invisible to the planner.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cluster::PodRecord;
use crate::config::Config;
use crate::qty::{CpuQty, MemQty};

#[derive(Debug, Clone, Default)]
pub struct SectorDemand {
    pub cpu: CpuQty,
    pub memory: MemQty,
    pub pods: Vec<PodRecord>,
}

impl SectorDemand {
    pub fn is_zero(&self) -> bool {
        self.cpu.is_zero() && self.memory.is_zero()
    }

    /// Sector pods currently running on the given node. Drives the
    /// cordon-candidate ordering.
    pub fn running_pods_on(&self, node: &str) -> usize {
        self.pods
            .iter()
            .filter(|pod| pod.phase.counts_as_running() && pod.node_name.as_deref() == Some(node))
            .count()
    }
}

/// Sums requests per sector. Pending and running pods both count, bound or
/// not: queued work needs capacity to exist and placed work needs it to
/// keep existing. Every configured sector gets an entry, so zero-demand
/// sectors are still planned down to their floors.
pub fn project(config: &Config, pods: &[PodRecord]) -> BTreeMap<String, SectorDemand> {
    let mut demand: BTreeMap<String, SectorDemand> = config
        .sectors
        .keys()
        .map(|name| (name.clone(), SectorDemand::default()))
        .collect();
    for pod in pods {
        let sector = match &pod.sector {
            Some(sector) => sector,
            None => continue,
        };
        let entry = match demand.get_mut(sector) {
            Some(entry) => entry,
            None => {
                debug!(
                    pod = %format!("{}/{}", pod.namespace, pod.name),
                    sector = %sector,
                    "pod selects an unmanaged sector; ignored"
                );
                continue;
            }
        };
        entry.cpu += pod.cpu_request;
        entry.memory += pod.memory_request;
        entry.pods.push(pod.clone());
    }
    demand
}
