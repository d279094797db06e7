#![allow(dead_code)]

use async_trait::async_trait;
use cirrus_cloud::{CloudError, Invoker, Result};
use cirrus_cloud_alicloud::cen::{CenApi, PublishStatus, PublishedRouteEntry, RouteEntryRequest};
use cirrus_cloud_alicloud::cs::{
    Cluster, ClusterCerts, ClusterConfig, ClusterCreationResponse, ClusterState, CsApi,
    KubernetesCreationArgs, KubernetesNode, KubernetesScaleArgs, NodePage, PageInfo,
};
use cirrus_cloud_alicloud::sts::{CallerIdentity, StsApi};
use cirrus_cloud_alicloud::vpc::{RouteTable, VSwitch, VpcApi};
use cirrus_cloud_alicloud::{AlicloudClient, AlicloudConfig};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub const REGION: &str = "cn-hangzhou";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// In-memory Alibaba Cloud that records every call it serves
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<FakeState>,
}

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    /// Errors returned by the next calls of an action, in order
    pub failures: HashMap<String, VecDeque<CloudError>>,

    pub route_tables: HashMap<String, RouteTable>,
    pub vswitches: HashMap<String, VSwitch>,
    pub routes: Vec<(String, PublishedRouteEntry)>,
    /// Status a freshly published route reports
    pub publish_status: Option<PublishStatus>,
    pub publish_requests: Vec<RouteEntryRequest>,
    /// Withdrawn routes stay listed as `NonPublished` instead of disappearing
    pub withdraw_leaves_unpublished: bool,

    pub clusters: HashMap<String, Cluster>,
    /// States a cluster moves through on successive describes
    pub cluster_states: VecDeque<ClusterState>,
    /// Describes that still report `deleting` after a delete
    pub delete_lag: u32,
    pub nodes: Vec<KubernetesNode>,
    /// Node listings that come back empty before `nodes` shows up
    pub pending_node_polls: u32,
    pub certs: ClusterCerts,
    pub kube_config: String,
    pub create_requests: Vec<KubernetesCreationArgs>,
    pub scale_requests: Vec<KubernetesScaleArgs>,
    pub renames: Vec<String>,
}

impl FakeCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Make the next call of `action` fail with `err`.
    pub fn fail_next(&self, action: &str, err: CloudError) {
        self.state()
            .failures
            .entry(action.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == action).count()
    }

    pub fn add_route_table(&self, id: &str, router_id: &str, router_type: &str, vpc_id: &str) {
        self.state().route_tables.insert(
            id.to_string(),
            RouteTable {
                route_table_id: id.to_string(),
                router_id: router_id.to_string(),
                router_type: router_type.to_string(),
                vpc_id: vpc_id.to_string(),
            },
        );
    }

    pub fn add_route(&self, cen_id: &str, route_table_id: &str, cidr: &str, status: PublishStatus) {
        self.state().routes.push((
            cen_id.to_string(),
            PublishedRouteEntry {
                destination_cidr_block: cidr.to_string(),
                child_instance_route_table_id: route_table_id.to_string(),
                publish_status: status,
                route_type: "Custom".to_string(),
                next_hop_type: String::new(),
                next_hop_id: String::new(),
            },
        ));
    }

    pub fn add_vswitch(&self, id: &str, vpc_id: &str, zone_id: &str) {
        self.state().vswitches.insert(
            id.to_string(),
            VSwitch {
                vswitch_id: id.to_string(),
                vpc_id: vpc_id.to_string(),
                zone_id: zone_id.to_string(),
                cidr_block: "192.168.0.0/24".to_string(),
            },
        );
    }

    pub fn add_cluster(&self, id: &str, state: ClusterState) {
        self.state().clusters.insert(id.to_string(), cluster(id, state));
    }

    pub fn add_nodes(&self, count: usize) {
        let mut state = self.state();
        for i in 0..count {
            state.nodes.push(KubernetesNode {
                instance_id: format!("i-{i}"),
                instance_name: format!("worker-{i}"),
                ip_address: vec![format!("192.168.0.{}", i + 10)],
                ..Default::default()
            });
        }
    }

    fn record(&self, action: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(action.to_string());
        match state.failures.get_mut(action).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn cluster(id: &str, state: ClusterState) -> Cluster {
    Cluster {
        cluster_id: id.to_string(),
        name: "k8s".to_string(),
        state,
        region_id: REGION.to_string(),
        zone_id: "cn-hangzhou-g".to_string(),
        vpc_id: "vpc-1".to_string(),
        vswitch_id: "vsw-1".to_string(),
        security_group_id: "sg-1".to_string(),
        cluster_type: "ManagedKubernetes".to_string(),
    }
}

fn cluster_not_found(id: &str) -> CloudError {
    CloudError::api("ErrorClusterNotFound", format!("cluster {id} not found"))
}

fn matches(cen_id: &str, entry: &PublishedRouteEntry, request: &RouteEntryRequest) -> bool {
    cen_id == request.cen_id
        && entry.child_instance_route_table_id == request.child_instance_route_table_id
        && entry.destination_cidr_block == request.destination_cidr_block
}

#[async_trait]
impl CenApi for FakeCloud {
    async fn publish_route_entries(&self, request: &RouteEntryRequest) -> Result<()> {
        self.record("PublishRouteEntries")?;
        let mut state = self.state();
        let status = state
            .publish_status
            .clone()
            .unwrap_or(PublishStatus::Published);
        state.publish_requests.push(request.clone());
        state.routes.push((
            request.cen_id.clone(),
            PublishedRouteEntry {
                destination_cidr_block: request.destination_cidr_block.clone(),
                child_instance_route_table_id: request.child_instance_route_table_id.clone(),
                publish_status: status,
                route_type: "Custom".to_string(),
                next_hop_type: String::new(),
                next_hop_id: String::new(),
            },
        ));
        Ok(())
    }

    async fn withdraw_published_route_entries(&self, request: &RouteEntryRequest) -> Result<()> {
        self.record("WithdrawPublishedRouteEntries")?;
        let mut state = self.state();
        if state.withdraw_leaves_unpublished {
            let mut found = false;
            for (cen, e) in state.routes.iter_mut() {
                if matches(cen, e, request) {
                    e.publish_status = PublishStatus::NonPublished;
                    found = true;
                }
            }
            if found {
                return Ok(());
            }
        }
        let before = state.routes.len();
        state.routes.retain(|(cen, e)| !matches(cen, e, request));
        if state.routes.len() == before {
            return Err(CloudError::api(
                "InvalidOperation.NotFoundRoute",
                "The specified route entry is not found.",
            ));
        }
        Ok(())
    }

    async fn describe_published_route_entries(
        &self,
        request: &RouteEntryRequest,
    ) -> Result<Vec<PublishedRouteEntry>> {
        self.record("DescribePublishedRouteEntries")?;
        Ok(self
            .state()
            .routes
            .iter()
            .filter(|(cen, e)| {
                *cen == request.cen_id
                    && e.child_instance_route_table_id == request.child_instance_route_table_id
            })
            .map(|(_, e)| e.clone())
            .collect())
    }
}

#[async_trait]
impl VpcApi for FakeCloud {
    async fn describe_vswitch(&self, vswitch_id: &str) -> Result<VSwitch> {
        self.record("DescribeVSwitchAttributes")?;
        self.state()
            .vswitches
            .get(vswitch_id)
            .cloned()
            .ok_or_else(|| CloudError::api("InvalidVSwitchId.NotFound", vswitch_id))
    }

    async fn describe_route_table(&self, route_table_id: &str) -> Result<RouteTable> {
        self.record("DescribeRouteTableList")?;
        self.state()
            .route_tables
            .get(route_table_id)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("route table {route_table_id}")))
    }
}

#[async_trait]
impl StsApi for FakeCloud {
    async fn get_caller_identity(&self) -> Result<CallerIdentity> {
        self.record("GetCallerIdentity")?;
        Ok(CallerIdentity {
            account_id: "1234567890".to_string(),
            arn: "acs:ram::1234567890:root".to_string(),
            user_id: "1234567890".to_string(),
            identity_type: "Account".to_string(),
        })
    }
}

#[async_trait]
impl CsApi for FakeCloud {
    async fn create_kubernetes_cluster(
        &self,
        region_id: &str,
        args: &KubernetesCreationArgs,
    ) -> Result<ClusterCreationResponse> {
        self.record("CreateKubernetesCluster")?;
        let mut state = self.state();
        let id = format!("c{}", state.clusters.len() + 1);

        let mut created = cluster(&id, ClusterState::Initial);
        created.name = args.name.clone();
        created.region_id = region_id.to_string();
        created.vpc_id = args.vpc_id.clone();
        created.zone_id = args.zone_id.clone();
        state.clusters.insert(id.clone(), created);
        state.create_requests.push(args.clone());

        Ok(ClusterCreationResponse {
            cluster_id: id,
            request_id: "req-1".to_string(),
            task_id: "T-1".to_string(),
        })
    }

    async fn describe_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        self.record("DescribeCluster")?;
        let mut guard = self.state();
        let state = &mut *guard;

        let Some(cluster) = state.clusters.get_mut(cluster_id) else {
            return Err(cluster_not_found(cluster_id));
        };

        if cluster.state == ClusterState::Deleting {
            if state.delete_lag == 0 {
                state.clusters.remove(cluster_id);
                return Err(cluster_not_found(cluster_id));
            }
            state.delete_lag -= 1;
        } else if let Some(next) = state.cluster_states.pop_front() {
            cluster.state = next;
        }
        Ok(cluster.clone())
    }

    async fn scale_kubernetes_cluster(
        &self,
        cluster_id: &str,
        args: &KubernetesScaleArgs,
    ) -> Result<()> {
        self.record("ScaleCluster")?;
        let mut state = self.state();
        if !state.clusters.contains_key(cluster_id) {
            return Err(cluster_not_found(cluster_id));
        }
        state.scale_requests.push(args.clone());
        Ok(())
    }

    async fn modify_cluster_name(&self, cluster_id: &str, name: &str) -> Result<()> {
        self.record("ModifyClusterName")?;
        let mut state = self.state();
        state.renames.push(name.to_string());
        match state.clusters.get_mut(cluster_id) {
            Some(cluster) => {
                cluster.name = name.to_string();
                Ok(())
            }
            None => Err(cluster_not_found(cluster_id)),
        }
    }

    async fn get_cluster_nodes(
        &self,
        cluster_id: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<NodePage> {
        self.record("GetClusterNodes")?;
        let mut state = self.state();
        if !state.clusters.contains_key(cluster_id) {
            return Err(cluster_not_found(cluster_id));
        }

        let page = PageInfo {
            page_number,
            page_size,
            total_count: state.nodes.len() as u32,
        };
        if state.pending_node_polls > 0 {
            state.pending_node_polls -= 1;
            return Ok(NodePage {
                nodes: Vec::new(),
                page,
            });
        }

        let start = ((page_number - 1) * page_size) as usize;
        let nodes = state
            .nodes
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Ok(NodePage { nodes, page })
    }

    async fn get_cluster_certs(&self, _cluster_id: &str) -> Result<ClusterCerts> {
        self.record("GetClusterCerts")?;
        Ok(self.state().certs.clone())
    }

    async fn get_cluster_config(&self, _cluster_id: &str) -> Result<ClusterConfig> {
        self.record("GetClusterConfig")?;
        Ok(ClusterConfig {
            config: self.state().kube_config.clone(),
        })
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<()> {
        self.record("DeleteCluster")?;
        let mut state = self.state();
        match state.clusters.get_mut(cluster_id) {
            Some(cluster) => {
                cluster.state = ClusterState::Deleting;
                Ok(())
            }
            None => Err(cluster_not_found(cluster_id)),
        }
    }
}

/// Client over `fake` that never retries throttling
pub fn client(fake: &Arc<FakeCloud>) -> AlicloudClient {
    client_with(fake, AlicloudConfig::new(REGION))
}

pub fn client_with(fake: &Arc<FakeCloud>, config: AlicloudConfig) -> AlicloudClient {
    AlicloudClient::new(&config, fake.clone()).with_invoker(Invoker::passthrough())
}
