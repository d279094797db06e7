//! Container Service (CS) API surface for managed Kubernetes clusters

use crate::client::AlicloudClient;
use crate::codes::CLUSTER_GONE;
use async_trait::async_trait;
use cirrus_cloud::{Progress, Result, Waiter};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll interval while waiting on a cluster
pub const CLUSTER_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[async_trait]
pub trait CsApi: Send + Sync {
    async fn create_kubernetes_cluster(
        &self,
        region_id: &str,
        args: &KubernetesCreationArgs,
    ) -> Result<ClusterCreationResponse>;

    async fn describe_cluster(&self, cluster_id: &str) -> Result<Cluster>;

    async fn scale_kubernetes_cluster(
        &self,
        cluster_id: &str,
        args: &KubernetesScaleArgs,
    ) -> Result<()>;

    async fn modify_cluster_name(&self, cluster_id: &str, name: &str) -> Result<()>;

    async fn get_cluster_nodes(
        &self,
        cluster_id: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<NodePage>;

    async fn get_cluster_certs(&self, cluster_id: &str) -> Result<ClusterCerts>;

    async fn get_cluster_config(&self, cluster_id: &str) -> Result<ClusterConfig>;

    async fn delete_cluster(&self, cluster_id: &str) -> Result<()>;
}

/// Lifecycle state of a cluster as reported by the container service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterState {
    #[default]
    Initial,
    Failed,
    Running,
    Updating,
    Scaling,
    Deleting,
    DeleteFailed,
    Deleted,
    InActive,
    Other(String),
}

impl ClusterState {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterState::Initial => "initial",
            ClusterState::Failed => "failed",
            ClusterState::Running => "running",
            ClusterState::Updating => "updating",
            ClusterState::Scaling => "scaling",
            ClusterState::Deleting => "deleting",
            ClusterState::DeleteFailed => "delete_failed",
            ClusterState::Deleted => "deleted",
            ClusterState::InActive => "inactive",
            ClusterState::Other(s) => s,
        }
    }

    /// States in which the node list does not change without explicit action
    pub fn is_node_stable(&self) -> bool {
        matches!(
            self,
            ClusterState::Running
                | ClusterState::Updating
                | ClusterState::Failed
                | ClusterState::DeleteFailed
                | ClusterState::Deleted
                | ClusterState::InActive
        )
    }

    /// Settled states a cluster never leaves on its own
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            ClusterState::Failed
                | ClusterState::DeleteFailed
                | ClusterState::Deleted
                | ClusterState::InActive
        )
    }
}

impl From<String> for ClusterState {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "initial" => ClusterState::Initial,
            "failed" => ClusterState::Failed,
            "running" => ClusterState::Running,
            "updating" => ClusterState::Updating,
            "scaling" => ClusterState::Scaling,
            "deleting" => ClusterState::Deleting,
            "delete_failed" => ClusterState::DeleteFailed,
            "deleted" => ClusterState::Deleted,
            "inactive" => ClusterState::InActive,
            _ => ClusterState::Other(s),
        }
    }
}

impl From<ClusterState> for String {
    fn from(state: ClusterState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub cluster_id: String,
    pub name: String,
    pub state: ClusterState,
    pub region_id: String,
    pub zone_id: String,
    pub vpc_id: String,
    pub vswitch_id: String,
    pub security_group_id: String,
    pub cluster_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterCreationResponse {
    pub cluster_id: String,
    pub request_id: String,
    pub task_id: String,
}

/// Request body for creating a managed Kubernetes cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KubernetesCreationArgs {
    pub name: String,
    pub cluster_type: String,
    pub disable_rollback: bool,
    pub timeout_mins: u32,
    pub region_id: String,
    #[serde(rename = "vpcid")]
    pub vpc_id: String,
    #[serde(rename = "zoneid", skip_serializing_if = "String::is_empty")]
    pub zone_id: String,
    pub vswitch_ids: Vec<String>,
    pub worker_instance_types: Vec<String>,
    pub num_of_nodes: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub login_password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_pair: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(rename = "container_cidr", skip_serializing_if = "String::is_empty")]
    pub pod_cidr: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_cidr: String,
    pub worker_system_disk_category: String,
    pub worker_system_disk_size: u32,
    pub worker_data_disk: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub worker_data_disk_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_data_disk_size: Option<u32>,
    pub worker_instance_charge_type: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub worker_period: Option<PrepaidPeriod>,
    pub snat_entry: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kubernetes_version: String,
    pub cloud_monitor_flags: bool,
    #[serde(rename = "endpoint_public_access")]
    pub public_slb: bool,
}

/// Billing period of subscription (PrePaid) worker nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrepaidPeriod {
    #[serde(rename = "worker_period")]
    pub period: u32,
    #[serde(rename = "worker_period_unit")]
    pub period_unit: String,
    #[serde(rename = "worker_auto_renew")]
    pub auto_renew: bool,
    #[serde(rename = "worker_auto_renew_period")]
    pub auto_renew_period: u32,
}

/// Request body for adding worker nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KubernetesScaleArgs {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub login_password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_pair: String,
    pub worker_instance_types: Vec<String>,
    pub worker_system_disk_category: String,
    pub worker_system_disk_size: u32,
    pub worker_data_disk: bool,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesNode {
    pub instance_id: String,
    pub instance_name: String,
    pub ip_address: Vec<String>,
    pub instance_type: String,
    pub node_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u32,
}

/// One page of `GET /clusters/{id}/nodes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePage {
    pub nodes: Vec<KubernetesNode>,
    pub page: PageInfo,
}

impl NodePage {
    /// A page whose first node already has an instance id assigned
    pub fn is_populated(&self) -> bool {
        self.nodes
            .first()
            .is_some_and(|node| !node.instance_id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterCerts {
    pub ca: String,
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub config: String,
}

/// Higher-level cluster operations over the raw CS calls
pub struct CsService<'a> {
    client: &'a AlicloudClient,
}

impl<'a> CsService<'a> {
    pub fn new(client: &'a AlicloudClient) -> Self {
        Self { client }
    }

    pub async fn describe_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        self.client
            .invoker()
            .run(|| self.client.cs().describe_cluster(cluster_id))
            .await
            .map_err(|e| e.not_found_on(CLUSTER_GONE))
    }

    /// Wait until the cluster reaches `target`. Settling in a failure state
    /// instead aborts the wait early.
    pub async fn wait_for_cluster(
        &self,
        cluster_id: &str,
        target: ClusterState,
        timeout: Duration,
    ) -> Result<Cluster> {
        let waiter = Waiter::new(format!("cluster {cluster_id} -> {target}"), timeout)
            .interval(CLUSTER_POLL_INTERVAL);

        let cluster = waiter
            .until(
                || async {
                    match self.describe_cluster(cluster_id).await {
                        Ok(cluster) => Ok(Some(cluster)),
                        // Not listed yet right after creation
                        Err(e) if e.is_not_found() => Ok(None),
                        Err(e) => Err(e),
                    }
                },
                |cluster: &Option<Cluster>| match cluster {
                    Some(c) if c.state == target => Progress::Done,
                    Some(c) if c.state.is_terminal_failure() => Progress::Failed(format!(
                        "cluster state {} is stable but not the expected {target}",
                        c.state
                    )),
                    _ => Progress::Pending,
                },
            )
            .await?;

        Ok(cluster.flatten().unwrap_or_default())
    }
}
