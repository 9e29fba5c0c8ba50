//! The decision kernel. Each sector is planned independently from one
//! consistent snapshot: demand becomes per-size node counts, counts become
//! per-fleet targets, and target deltas become cordon / uncordon intent.
//!
//! Planning is a pure function of `(config, cluster snapshot, fleet
//! snapshot)`; the only hysteresis is the oversubscription margin and the
//! per-fleet capacity floor.

use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::{debug, warn};

use crate::catalog::{self, NodeShape, Size};
use crate::cluster::NodeRecord;
use crate::config::{Config, FleetSpec, Sector};
use crate::demand::SectorDemand;
use crate::fleet::{FleetKey, FleetObservation};
use crate::qty::{CpuQty, MemQty};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetPlan {
    pub sector: String,
    pub size: Size,
    pub fleet_id: String,
    pub current_target: u32,
    pub desired_target: u32,
    /// Nodes to mark unschedulable, in selection order.
    pub cordon: Vec<String>,
    /// Manager-cordoned nodes to return to service.
    pub uncordon: Vec<String>,
}

impl FleetPlan {
    pub fn name(&self) -> String {
        format!("{}/{}", self.sector, self.size)
    }

    /// True when the observed state already matches the decision.
    pub fn is_noop(&self) -> bool {
        self.desired_target == self.current_target
            && self.cordon.is_empty()
            && self.uncordon.is_empty()
    }
}

/// Builds the per-fleet plans for every healthy fleet, in `(sector, size)`
/// order. Fleets absent from the fleet snapshot are skipped; their sector's
/// demand is allocated over the fleets that can actually be actuated.
pub fn plan(
    config: &Config,
    nodes: &[NodeRecord],
    demand: &BTreeMap<String, SectorDemand>,
    fleets: &BTreeMap<FleetKey, FleetObservation>,
) -> Vec<FleetPlan> {
    let no_demand = SectorDemand::default();
    let mut plans = Vec::new();
    for sector in config.sectors.values() {
        let sector_demand = demand.get(&sector.name).unwrap_or(&no_demand);
        plans.extend(plan_sector(config, sector, sector_demand, nodes, fleets));
    }
    plans
}

struct SizedShape {
    size: Size,
    /// Per-node capacity after reservation.
    schedulable: NodeShape,
    /// Schedulable capacity inflated by the oversubscription margin.
    effective: NodeShape,
}

fn plan_sector(
    config: &Config,
    sector: &Sector,
    demand: &SectorDemand,
    nodes: &[NodeRecord],
    fleets: &BTreeMap<FleetKey, FleetObservation>,
) -> Vec<FleetPlan> {
    let healthy: Vec<(&FleetSpec, &FleetObservation)> = sector
        .fleets
        .iter()
        .filter_map(|spec| {
            fleets
                .get(&(spec.sector.clone(), spec.size))
                .map(|observation| (spec, observation))
        })
        .collect();
    if healthy.is_empty() {
        debug!(sector = %sector.name, "no healthy fleets this tick");
        return Vec::new();
    }

    let shapes: Vec<SizedShape> = healthy
        .iter()
        .map(|(spec, _)| {
            let nominal = catalog::node_shape(spec.size, sector.kind);
            let schedulable = nominal.minus_reserved(config.reserved_cpus, config.reserved_memory);
            if schedulable.is_degenerate() {
                warn!(
                    fleet = %spec.name(),
                    "reservation leaves no schedulable capacity; fleet can never satisfy demand"
                );
            }
            SizedShape {
                size: spec.size,
                schedulable,
                effective: schedulable.over_subscribed(config.over_subscription_bps),
            }
        })
        .collect();

    let counts = allocate(&shapes, demand.cpu, demand.memory);

    let nodes_by_size = nodes
        .iter()
        .filter(|node| node.sector == sector.name)
        .map(|node| (node.size, node))
        .into_group_map();

    let mut plans = Vec::with_capacity(healthy.len());
    for (spec, observation) in healthy {
        let candidate = counts.get(&spec.size).copied().unwrap_or(0);
        let candidate = u32::try_from(candidate).unwrap_or(u32::MAX);
        let desired_target = candidate.max(spec.min_capacity);
        let current_target = observation.target_capacity;
        let fleet_nodes: Vec<&NodeRecord> = nodes_by_size
            .get(&spec.size)
            .cloned()
            .unwrap_or_default();
        debug!(
            fleet = %spec.name(),
            fleet_id = %observation.fleet_id,
            instances = observation.instance_ids.len(),
            nodes = fleet_nodes.len(),
            current = current_target,
            desired = desired_target,
            "fleet decision"
        );
        if observation.instance_ids.len() != fleet_nodes.len() {
            debug!(
                fleet = %spec.name(),
                instances = observation.instance_ids.len(),
                nodes = fleet_nodes.len(),
                "fleet instances and cluster nodes disagree; still converging"
            );
        }

        let ordered = shed_order(&fleet_nodes, demand);
        let mut cordon = Vec::new();
        let mut uncordon = Vec::new();
        if desired_target < current_target {
            // Scaling in: mark the surplus unschedulable; the fleet reaps
            // instances as it converges on the lowered target.
            let surplus = (current_target - desired_target) as usize;
            cordon = ordered
                .iter()
                .take(surplus)
                .filter(|node| !node.unschedulable)
                .map(|node| node.name.clone())
                .collect();
        } else {
            // Not scaling in: return manager-cordoned nodes to service,
            // except those still covering nodes the fleet has yet to reap.
            let shed_need = fleet_nodes.len().saturating_sub(desired_target as usize);
            uncordon = ordered
                .iter()
                .filter(|node| node.cordoned_by_us)
                .skip(shed_need)
                .map(|node| node.name.clone())
                .collect();
        }

        plans.push(FleetPlan {
            sector: sector.name.clone(),
            size: spec.size,
            fleet_id: observation.fleet_id.clone(),
            current_target,
            desired_target,
            cordon,
            uncordon,
        });
    }
    plans
}

/// Shed preference: nodes we already cordoned, then the ones carrying the
/// fewest running sector pods, then the oldest, then by name. The same
/// order decides which cordoned nodes keep covering an unreaped surplus.
fn shed_order<'a>(fleet_nodes: &[&'a NodeRecord], demand: &SectorDemand) -> Vec<&'a NodeRecord> {
    fleet_nodes
        .iter()
        .copied()
        .sorted_by_key(|node| {
            (
                !node.cordoned_by_us,
                demand.running_pods_on(&node.name),
                node.created,
                node.name.clone(),
            )
        })
        .collect()
}

/// Turns sector demand into a node count per size.
///
/// Every size above the smallest takes the whole-node floor of the
/// remaining demand, binding dimension deciding, and passes the remainder
/// down. A nonzero residual goes to the smallest size able to host it
/// whole with margin to spare (judged on un-inflated capacity); when no
/// single node can, the smallest size absorbs it by ceil-division.
fn allocate(shapes: &[SizedShape], cpu: CpuQty, memory: MemQty) -> BTreeMap<Size, u64> {
    let mut counts: BTreeMap<Size, u64> = shapes.iter().map(|shape| (shape.size, 0)).collect();
    if cpu.is_zero() && memory.is_zero() {
        return counts;
    }
    let usable: Vec<&SizedShape> = shapes
        .iter()
        .filter(|shape| !shape.effective.is_degenerate())
        .collect();
    let (smallest, larger) = match usable.split_first() {
        Some(split) => split,
        None => {
            warn!("no fleet in the sector has schedulable capacity; demand cannot be satisfied");
            return counts;
        }
    };

    let mut rem_cpu = cpu;
    let mut rem_mem = memory;
    for shape in larger.iter().rev() {
        let by_cpu = rem_cpu.millis() / shape.effective.cpu.millis();
        let by_mem = rem_mem.bytes() / shape.effective.memory.bytes();
        let whole = by_cpu.max(by_mem);
        if whole == 0 {
            continue;
        }
        *counts.get_mut(&shape.size).expect("size present") += whole;
        rem_cpu = rem_cpu.saturating_sub(shape.effective.cpu.times(whole));
        rem_mem = rem_mem.saturating_sub(shape.effective.memory.times(whole));
    }
    if rem_cpu.is_zero() && rem_mem.is_zero() {
        return counts;
    }

    if let Some(host) = usable
        .iter()
        .find(|shape| shape.schedulable.exceeds(rem_cpu, rem_mem))
    {
        *counts.get_mut(&host.size).expect("size present") += 1;
    } else {
        let by_cpu = rem_cpu.ceil_div(smallest.effective.cpu).unwrap_or(0);
        let by_mem = rem_mem.ceil_div(smallest.effective.memory).unwrap_or(0);
        *counts.get_mut(&smallest.size).expect("size present") += by_cpu.max(by_mem);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Kind;
    use crate::cluster::{PodPhase, PodRecord};
    use crate::config::testing::{config_with, test_config};
    use chrono::{TimeZone, Utc};

    fn node(
        name: &str,
        sector: &str,
        size: Size,
        kind: Kind,
        created_min: i64,
        unschedulable: bool,
        ours: bool,
    ) -> NodeRecord {
        NodeRecord {
            name: name.to_string(),
            sector: sector.to_string(),
            size,
            kind,
            lifecycle: Some("Ec2Spot".to_string()),
            unschedulable,
            cordoned_by_us: ours,
            allocatable_cpu: CpuQty::from_cores(8),
            allocatable_memory: MemQty::from_mebibytes(59_904),
            created: Some(Utc.timestamp_opt(1_700_000_000 + created_min * 60, 0).unwrap()),
        }
    }

    fn obs(fleet_id: &str, target: u32, instances: usize) -> FleetObservation {
        FleetObservation {
            fleet_id: fleet_id.to_string(),
            target_capacity: target,
            instance_ids: (0..instances).map(|i| format!("i-{fleet_id}-{i}")).collect(),
        }
    }

    fn fleet_map(entries: Vec<(&str, Size, FleetObservation)>) -> BTreeMap<FleetKey, FleetObservation> {
        entries
            .into_iter()
            .map(|(sector, size, observation)| ((sector.to_string(), size), observation))
            .collect()
    }

    fn demand_map(sector: &str, cpu: CpuQty, memory: MemQty, pods: Vec<PodRecord>) -> BTreeMap<String, SectorDemand> {
        let mut map = BTreeMap::new();
        map.insert(sector.to_string(), SectorDemand { cpu, memory, pods });
        map
    }

    fn running_pod(name: &str, sector: &str, node: &str) -> PodRecord {
        PodRecord {
            namespace: "jobs".to_string(),
            name: name.to_string(),
            phase: PodPhase::Running,
            node_name: Some(node.to_string()),
            sector: Some(sector.to_string()),
            cpu_request: CpuQty::from_millis(100),
            memory_request: MemQty::from_mebibytes(128),
        }
    }

    fn find<'a>(plans: &'a [FleetPlan], sector: &str, size: Size) -> &'a FleetPlan {
        plans
            .iter()
            .find(|p| p.sector == sector && p.size == size)
            .unwrap()
    }

    #[test]
    fn scale_from_zero_picks_the_smallest_node_that_hosts_the_pod_with_margin() {
        let config = test_config();
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(3),
            MemQty::from_mebibytes(20 * 1024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![
            ("primary", Size::Small, obs("fleet-ps", 0, 0)),
            ("primary", Size::Medium, obs("fleet-pm", 0, 0)),
            ("coordinate", Size::Small, obs("fleet-cs", 2, 2)),
        ]);
        let plans = plan(&config, &[], &demand, &fleets);

        // Small's 3 schedulable cores equal the request exactly; medium is
        // the smallest tier with real margin.
        assert_eq!(find(&plans, "primary", Size::Medium).desired_target, 1);
        assert_eq!(find(&plans, "primary", Size::Small).desired_target, 0);
        assert!(find(&plans, "primary", Size::Small).is_noop());
    }

    #[test]
    fn honors_min_capacity_without_demand() {
        let config = test_config();
        let demand = demand_map("coordinate", CpuQty::default(), MemQty::default(), Vec::new());
        let fleets = fleet_map(vec![
            ("primary", Size::Small, obs("fleet-ps", 0, 0)),
            ("primary", Size::Medium, obs("fleet-pm", 0, 0)),
            ("coordinate", Size::Small, obs("fleet-cs", 2, 2)),
        ]);
        let plans = plan(&config, &[], &demand, &fleets);
        let coordinate = find(&plans, "coordinate", Size::Small);
        assert_eq!(coordinate.desired_target, 2);
        assert!(coordinate.cordon.is_empty() && coordinate.uncordon.is_empty());
    }

    #[test]
    fn scale_in_cordons_the_oldest_nodes() {
        let config = config_with(
            2_000,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Small, 1)])],
        );
        let nodes = vec![
            node("n-new", "primary", Size::Small, Kind::Memory, 120, false, false),
            node("n-old", "primary", Size::Small, Kind::Memory, 0, false, false),
            node("n-mid", "primary", Size::Small, Kind::Memory, 60, false, false),
        ];
        let demand = demand_map("primary", CpuQty::default(), MemQty::default(), Vec::new());
        let fleets = fleet_map(vec![("primary", Size::Small, obs("fleet-ps", 3, 3))]);
        let plans = plan(&config, &nodes, &demand, &fleets);

        let small = find(&plans, "primary", Size::Small);
        assert_eq!(small.desired_target, 1);
        assert_eq!(small.cordon, vec!["n-old".to_string(), "n-mid".to_string()]);
        assert!(small.uncordon.is_empty());
    }

    #[test]
    fn cordon_prefers_already_cordoned_then_emptiest_nodes() {
        let config = config_with(
            2_000,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Small, 1)])],
        );
        let nodes = vec![
            node("n-busy", "primary", Size::Small, Kind::Memory, 0, false, false),
            node("n-idle", "primary", Size::Small, Kind::Memory, 60, false, false),
            node("n-done", "primary", Size::Small, Kind::Memory, 120, true, true),
        ];
        let pods = vec![
            running_pod("a", "primary", "n-busy"),
            running_pod("b", "primary", "n-busy"),
        ];
        let demand = demand_map("primary", CpuQty::from_millis(200), MemQty::from_mebibytes(256), pods);
        let fleets = fleet_map(vec![("primary", Size::Small, obs("fleet-ps", 3, 3))]);
        let plans = plan(&config, &nodes, &demand, &fleets);

        // Surplus of two: the node we already cordoned fills one slot
        // without a patch, the idle node takes the other.
        let small = find(&plans, "primary", Size::Small);
        assert_eq!(small.desired_target, 1);
        assert_eq!(small.cordon, vec!["n-idle".to_string()]);
        assert!(small.uncordon.is_empty());
    }

    #[test]
    fn uncordon_on_recovery() {
        let config = config_with(
            2_000,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Small, 1)])],
        );
        let nodes = vec![
            node("n-1", "primary", Size::Small, Kind::Memory, 0, true, true),
            node("n-2", "primary", Size::Small, Kind::Memory, 60, true, true),
        ];
        // Enough work to need both nodes again.
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(7),
            MemQty::from_mebibytes(40 * 1024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![("primary", Size::Small, obs("fleet-ps", 2, 2))]);
        let plans = plan(&config, &nodes, &demand, &fleets);

        let small = find(&plans, "primary", Size::Small);
        assert_eq!(small.desired_target, 2);
        assert!(small.cordon.is_empty());
        assert_eq!(small.uncordon, vec!["n-1".to_string(), "n-2".to_string()]);
    }

    #[test]
    fn cordoned_nodes_stay_shed_until_the_fleet_reaps_them() {
        // After a scale-in is actuated the target is already lowered but
        // the surplus nodes still exist; they must not bounce back.
        let config = config_with(
            2_000,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Small, 1)])],
        );
        let nodes = vec![
            node("n-new", "primary", Size::Small, Kind::Memory, 120, false, false),
            node("n-old", "primary", Size::Small, Kind::Memory, 0, true, true),
            node("n-mid", "primary", Size::Small, Kind::Memory, 60, true, true),
        ];
        let demand = demand_map("primary", CpuQty::default(), MemQty::default(), Vec::new());
        let fleets = fleet_map(vec![("primary", Size::Small, obs("fleet-ps", 1, 3))]);
        let plans = plan(&config, &nodes, &demand, &fleets);
        assert!(find(&plans, "primary", Size::Small).is_noop());
    }

    #[test]
    fn memory_binds_when_it_dominates() {
        let config = config_with(
            0,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Medium, 0)])],
        );
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(180 * 1024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![("primary", Size::Medium, obs("fleet-pm", 0, 0))]);
        let plans = plan(&config, &[], &demand, &fleets);
        // 180Gi over 58.5Gi schedulable per node.
        assert_eq!(find(&plans, "primary", Size::Medium).desired_target, 4);
    }

    #[test]
    fn large_demand_lands_on_large_nodes_with_a_small_tail() {
        let config = test_config();
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(18),
            MemQty::from_mebibytes(120 * 1024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![
            ("primary", Size::Small, obs("fleet-ps", 0, 0)),
            ("primary", Size::Medium, obs("fleet-pm", 0, 0)),
        ]);
        let plans = plan(&config, &[], &demand, &fleets);
        // Effective medium node: 8.4 cores / 70.2Gi. CPU binds: two whole
        // mediums leave 1.2 cores, hosted by one small with margin.
        assert_eq!(find(&plans, "primary", Size::Medium).desired_target, 2);
        assert_eq!(find(&plans, "primary", Size::Small).desired_target, 1);
    }

    #[test]
    fn a_missing_fleet_leaves_demand_on_the_healthy_ones() {
        let config = test_config();
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(3),
            MemQty::from_mebibytes(20 * 1024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![("primary", Size::Small, obs("fleet-ps", 0, 0))]);
        let plans = plan(&config, &[], &demand, &fleets);
        assert_eq!(plans.len(), 1);
        // With medium unreadable this tick, small hosts the work by
        // ceil-division even without strict margin.
        assert_eq!(find(&plans, "primary", Size::Small).desired_target, 1);
    }

    #[test]
    fn a_fully_reserved_tier_falls_back_to_its_floor() {
        let config = config_with(
            0,
            CpuQty::from_cores(4),
            MemQty::from_mebibytes(2_560),
            &[("starved", Kind::Memory, &[(Size::XSmall, 1)])],
        );
        let demand = demand_map(
            "starved",
            CpuQty::from_cores(2),
            MemQty::from_mebibytes(1_024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![("starved", Size::XSmall, obs("fleet-x", 1, 1))]);
        let plans = plan(&config, &[], &demand, &fleets);
        let xsmall = find(&plans, "starved", Size::XSmall);
        assert_eq!(xsmall.desired_target, 1);
        assert!(xsmall.is_noop());
    }

    #[test]
    fn desired_target_never_dips_below_min_capacity() {
        let config = config_with(
            2_000,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Small, 3), (Size::Large, 2)])],
        );
        let fleets = fleet_map(vec![
            ("primary", Size::Small, obs("fleet-ps", 3, 3)),
            ("primary", Size::Large, obs("fleet-pl", 2, 2)),
        ]);
        for cores in [0u64, 1, 10, 100] {
            let demand = demand_map(
                "primary",
                CpuQty::from_cores(cores),
                MemQty::from_mebibytes(cores * 1_024),
                Vec::new(),
            );
            for plan in plan(&config, &[], &demand, &fleets) {
                let min = config.sectors["primary"]
                    .fleets
                    .iter()
                    .find(|f| f.size == plan.size)
                    .unwrap()
                    .min_capacity;
                assert!(plan.desired_target >= min);
            }
        }
    }

    #[test]
    fn cordon_and_uncordon_reference_only_the_fleet_and_stay_disjoint() {
        let config = test_config();
        let nodes = vec![
            node("ps-1", "primary", Size::Small, Kind::Memory, 0, false, false),
            node("ps-2", "primary", Size::Small, Kind::Memory, 10, true, true),
            node("pm-1", "primary", Size::Medium, Kind::Memory, 0, true, true),
            node("cs-1", "coordinate", Size::Small, Kind::Cpu, 0, false, false),
        ];
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(12),
            MemQty::from_mebibytes(100 * 1024),
            Vec::new(),
        );
        let fleets = fleet_map(vec![
            ("primary", Size::Small, obs("fleet-ps", 4, 2)),
            ("primary", Size::Medium, obs("fleet-pm", 1, 1)),
            ("coordinate", Size::Small, obs("fleet-cs", 2, 1)),
        ]);
        let plans = plan(&config, &nodes, &demand, &fleets);
        for fleet_plan in &plans {
            let fleet_node_names: Vec<&str> = nodes
                .iter()
                .filter(|n| n.sector == fleet_plan.sector && n.size == fleet_plan.size)
                .map(|n| n.name.as_str())
                .collect();
            for name in fleet_plan.cordon.iter().chain(&fleet_plan.uncordon) {
                assert!(fleet_node_names.contains(&name.as_str()));
                assert!(!(fleet_plan.cordon.contains(name) && fleet_plan.uncordon.contains(name)));
            }
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let config = test_config();
        let nodes = vec![
            node("ps-1", "primary", Size::Small, Kind::Memory, 0, false, false),
            node("ps-2", "primary", Size::Small, Kind::Memory, 10, true, true),
        ];
        let demand = demand_map(
            "primary",
            CpuQty::from_cores(5),
            MemQty::from_mebibytes(33 * 1024),
            vec![running_pod("a", "primary", "ps-1")],
        );
        let fleets = fleet_map(vec![
            ("primary", Size::Small, obs("fleet-ps", 2, 2)),
            ("primary", Size::Medium, obs("fleet-pm", 0, 0)),
        ]);
        let first = plan(&config, &nodes, &demand, &fleets);
        let second = plan(&config, &nodes, &demand, &fleets);
        assert_eq!(first, second);
    }

    #[test]
    fn applying_a_plan_then_replanning_is_a_noop() {
        let config = config_with(
            2_000,
            CpuQty::from_cores(1),
            MemQty::from_mebibytes(2_560),
            &[("primary", Kind::Memory, &[(Size::Small, 1)])],
        );
        let mut nodes = vec![
            node("n-new", "primary", Size::Small, Kind::Memory, 120, false, false),
            node("n-old", "primary", Size::Small, Kind::Memory, 0, false, false),
            node("n-mid", "primary", Size::Small, Kind::Memory, 60, false, false),
        ];
        let demand = demand_map("primary", CpuQty::default(), MemQty::default(), Vec::new());
        let fleets = fleet_map(vec![("primary", Size::Small, obs("fleet-ps", 3, 3))]);
        let before = plan(&config, &nodes, &demand, &fleets);
        let small = find(&before, "primary", Size::Small);
        assert!(!small.is_noop());

        // Apply: lower the target, mark the selected nodes cordoned.
        let fleets = fleet_map(vec![(
            "primary",
            Size::Small,
            obs("fleet-ps", small.desired_target, 3),
        )]);
        for name in &small.cordon {
            let node = nodes.iter_mut().find(|n| &n.name == name).unwrap();
            node.unschedulable = true;
            node.cordoned_by_us = true;
        }

        let after = plan(&config, &nodes, &demand, &fleets);
        assert!(after.iter().all(FleetPlan::is_noop));
    }
}
