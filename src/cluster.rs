//! Reads the orchestrator side of the world: managed nodes and the pods
//! steering work onto them, normalized into plain records consumed within a
//! single tick. Also owns the node schedulability patch used by the actuator.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ListParams, Patch, PatchParams};
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

use crate::catalog::{Kind, Size};
use crate::config::Config;
use crate::qty::{CpuQty, InvalidQuantity, MemQty};

pub const CLUSTER_LABEL: &str = "cluster";
pub const SECTOR_LABEL: &str = "sector";
pub const SIZE_LABEL: &str = "size";
pub const KIND_LABEL: &str = "kind";
pub const FLEET_LABEL: &str = "fleet";
pub const LIFECYCLE_LABEL: &str = "lifecycle";

/// Annotation distinguishing cordons we applied from operator cordons.
/// Nodes cordoned without it are never uncordoned by us.
pub const CORDON_ANNOTATION: &str = "fleet-manager/cordoned";

#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;
    async fn list_pods(&self) -> Result<Vec<Pod>>;
    async fn set_unschedulable(&self, node: &str, unschedulable: bool) -> Result<()>;
}

/// Production implementation over the kube client.
pub struct KubeCluster {
    client: kube::Client,
}

impl KubeCluster {
    pub fn new(client: kube::Client) -> Self {
        KubeCluster { client }
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api
            .list(&ListParams::default())
            .await
            .context("failed to list nodes via k8s api")?;
        Ok(nodes.items)
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let pods = api
            .list(&ListParams::default())
            .await
            .context("failed to list pods via k8s api")?;
        Ok(pods.items)
    }

    async fn set_unschedulable(&self, node: &str, unschedulable: bool) -> Result<()> {
        let api: Api<Node> = Api::all(self.client.clone());
        let patch = if unschedulable {
            json!({
                "metadata": { "annotations": { CORDON_ANNOTATION: "true" } },
                "spec": { "unschedulable": true },
            })
        } else {
            json!({
                "metadata": { "annotations": { CORDON_ANNOTATION: null } },
                "spec": { "unschedulable": false },
            })
        };
        api.patch(node, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .with_context(|| format!("failed to patch node {node} unschedulable={unschedulable}"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub sector: String,
    pub size: Size,
    pub kind: Kind,
    pub lifecycle: Option<String>,
    pub unschedulable: bool,
    /// Cordoned by this manager, as opposed to an operator.
    pub cordoned_by_us: bool,
    pub allocatable_cpu: CpuQty,
    pub allocatable_memory: MemQty,
    pub created: Option<DateTime<Utc>>,
}

impl NodeRecord {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.created
            .map(|created| now - created)
            .unwrap_or_else(chrono::Duration::zero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    fn parse(phase: Option<&str>) -> PodPhase {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            // Unknown usually means the kubelet stopped responding; the pod
            // may well still be running, so it keeps counting.
            _ => PodPhase::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }

    pub fn counts_as_running(self) -> bool {
        matches!(self, PodPhase::Running | PodPhase::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodRecord {
    pub namespace: String,
    pub name: String,
    pub phase: PodPhase,
    pub node_name: Option<String>,
    /// Value of the `sector` node-selector entry, when present.
    pub sector: Option<String>,
    pub cpu_request: CpuQty,
    pub memory_request: MemQty,
}

#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub pods: Vec<PodRecord>,
}

/// Lists nodes and pods and normalizes them. Any read failure or timeout
/// aborts the whole snapshot; the loop acts on fresh data or not at all.
#[instrument(skip(api, config))]
pub async fn take_snapshot<A: ClusterApi + ?Sized>(
    api: &A,
    config: &Config,
) -> Result<ClusterSnapshot> {
    let raw_nodes = tokio::time::timeout(config.request_timeout, api.list_nodes())
        .await
        .context("listing nodes timed out")??;
    let raw_pods = tokio::time::timeout(config.request_timeout, api.list_pods())
        .await
        .context("listing pods timed out")??;

    let nodes: Vec<NodeRecord> = raw_nodes
        .into_iter()
        .filter_map(|node| node_record(node, config))
        .collect();
    let pods: Vec<PodRecord> = raw_pods.into_iter().filter_map(pod_record).collect();

    let now = Utc::now();
    for node in &nodes {
        debug!(
            node = %node.name,
            sector = %node.sector,
            size = %node.size,
            lifecycle = ?node.lifecycle,
            unschedulable = node.unschedulable,
            cpu = %node.allocatable_cpu,
            memory = %node.allocatable_memory,
            age_s = node.age(now).num_seconds(),
            "managed node"
        );
    }
    debug!(nodes = nodes.len(), pods = pods.len(), "cluster snapshot");
    Ok(ClusterSnapshot { nodes, pods })
}

/// Keeps only nodes whose labels mark them as members of a managed fleet.
fn node_record(node: Node, config: &Config) -> Option<NodeRecord> {
    let name = node.metadata.name.clone()?;
    let labels = node.metadata.labels.as_ref()?;
    if labels.get(CLUSTER_LABEL)? != &config.cluster_name {
        return None;
    }
    let sector_name = labels.get(SECTOR_LABEL)?;
    let sector = config.sectors.get(sector_name)?;
    let size = Size::from_label(labels.get(SIZE_LABEL)?)?;
    let kind = Kind::from_label(labels.get(KIND_LABEL)?)?;
    labels.get(FLEET_LABEL)?;
    if kind != sector.kind {
        warn!(
            node = %name,
            sector = %sector_name,
            label_kind = %kind,
            configured_kind = %sector.kind,
            "node kind label disagrees with the sector configuration; ignoring node"
        );
        return None;
    }

    let unschedulable = node
        .spec
        .as_ref()
        .and_then(|s| s.unschedulable)
        .unwrap_or(false);
    let cordoned_by_us = unschedulable
        && node
            .metadata
            .annotations
            .as_ref()
            .map_or(false, |a| a.contains_key(CORDON_ANNOTATION));

    let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());
    let allocatable_cpu =
        lenient_qty(allocatable.and_then(|a| a.get("cpu")), &name, "cpu");
    let allocatable_memory =
        lenient_qty(allocatable.and_then(|a| a.get("memory")), &name, "memory");

    Some(NodeRecord {
        sector: sector_name.clone(),
        size,
        kind,
        lifecycle: labels.get(LIFECYCLE_LABEL).cloned(),
        unschedulable,
        cordoned_by_us,
        allocatable_cpu,
        allocatable_memory,
        created: node.metadata.creation_timestamp.as_ref().map(|t| t.0),
        name,
    })
}

/// Drops terminal pods; everything else is active or queued work. The
/// effective request is the sum over containers, absent requests counting
/// as zero.
fn pod_record(pod: Pod) -> Option<PodRecord> {
    let phase = PodPhase::parse(pod.status.as_ref().and_then(|s| s.phase.as_deref()));
    if phase.is_terminal() {
        return None;
    }
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();
    let name = pod.metadata.name.clone().unwrap_or_default();
    let owner = format!("{namespace}/{name}");
    let spec = pod.spec.as_ref();
    let node_name = spec.and_then(|s| s.node_name.clone());
    let sector = spec
        .and_then(|s| s.node_selector.as_ref())
        .and_then(|selector| selector.get(SECTOR_LABEL))
        .cloned();

    let mut cpu_request = CpuQty::default();
    let mut memory_request = MemQty::default();
    if let Some(spec) = spec {
        for container in &spec.containers {
            if let Some(requests) = container
                .resources
                .as_ref()
                .and_then(|r| r.requests.as_ref())
            {
                cpu_request += lenient_qty::<CpuQty>(requests.get("cpu"), &owner, "cpu");
                memory_request += lenient_qty::<MemQty>(requests.get("memory"), &owner, "memory");
            }
        }
    }

    Some(PodRecord {
        namespace,
        name,
        phase,
        node_name,
        sector,
        cpu_request,
        memory_request,
    })
}

/// A malformed quantity on a live object is not worth failing the tick
/// over: it contributes zero and leaves a trace.
fn lenient_qty<T>(value: Option<&Quantity>, owner: &str, resource: &str) -> T
where
    T: FromStr<Err = InvalidQuantity> + Default,
{
    match value {
        None => T::default(),
        Some(quantity) => match quantity.0.parse::<T>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(owner, resource, %err, "unreadable quantity treated as zero");
                T::default()
            }
        },
    }
}
