//! Applies fleet plans to the two write surfaces: node schedulability in
//! the cluster and target capacity in the cloud. Everything is best effort;
//! whatever fails converges on a later tick.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::cluster::ClusterApi;
use crate::fleet::FleetApi;
use crate::planner::FleetPlan;

pub struct Actuator<'a, C: ?Sized, F: ?Sized> {
    cluster: &'a C,
    fleets: &'a F,
    live: bool,
    timeout: Duration,
}

impl<'a, C: ClusterApi + ?Sized, F: FleetApi + ?Sized> Actuator<'a, C, F> {
    pub fn new(cluster: &'a C, fleets: &'a F, live: bool, timeout: Duration) -> Self {
        Actuator {
            cluster,
            fleets,
            live,
            timeout,
        }
    }

    /// Applies every plan with a delta. Returns how many fleets changed.
    #[instrument(skip(self, plans))]
    pub async fn apply(&self, plans: &[FleetPlan]) -> usize {
        let mut changed = 0;
        for plan in plans {
            if plan.is_noop() {
                debug!(fleet = %plan.name(), "observed state already matches the plan");
                continue;
            }
            changed += 1;
            self.apply_fleet(plan).await;
        }
        changed
    }

    /// Uncordon before cordon so schedulable capacity never briefly dips
    /// below the plan, target capacity last. Steps are independent; an
    /// earlier failure does not stop later steps and nothing rolls back.
    async fn apply_fleet(&self, plan: &FleetPlan) {
        for node in &plan.uncordon {
            self.patch_node(plan, node, false).await;
        }
        for node in &plan.cordon {
            self.patch_node(plan, node, true).await;
        }
        if plan.desired_target == plan.current_target {
            return;
        }
        if !self.live {
            info!(
                fleet = %plan.name(),
                fleet_id = %plan.fleet_id,
                current = plan.current_target,
                target = plan.desired_target,
                "dry-run: would modify fleet target capacity"
            );
            return;
        }
        let modify = self
            .fleets
            .set_target_capacity(&plan.fleet_id, plan.desired_target);
        match tokio::time::timeout(self.timeout, modify).await {
            Ok(Ok(())) => info!(
                fleet = %plan.name(),
                fleet_id = %plan.fleet_id,
                current = plan.current_target,
                target = plan.desired_target,
                "modified fleet target capacity"
            ),
            Ok(Err(err)) => warn!(
                fleet = %plan.name(),
                fleet_id = %plan.fleet_id,
                error = format!("{err:#}"),
                "failed to modify fleet target capacity; retrying next tick"
            ),
            Err(_) => warn!(
                fleet = %plan.name(),
                fleet_id = %plan.fleet_id,
                "fleet target modification timed out; retrying next tick"
            ),
        }
    }

    async fn patch_node(&self, plan: &FleetPlan, node: &str, unschedulable: bool) {
        let verb = if unschedulable { "cordon" } else { "uncordon" };
        if !self.live {
            info!(fleet = %plan.name(), node, "dry-run: would {} node", verb);
            return;
        }
        let patch = self.cluster.set_unschedulable(node, unschedulable);
        match tokio::time::timeout(self.timeout, patch).await {
            Ok(Ok(())) => info!(fleet = %plan.name(), node, "{}ed node", verb),
            Ok(Err(err)) => warn!(
                fleet = %plan.name(),
                node,
                error = format!("{err:#}"),
                "failed to {} node; retrying next tick", verb
            ),
            Err(_) => warn!(
                fleet = %plan.name(),
                node,
                "{} patch timed out; retrying next tick", verb
            ),
        }
    }
}
