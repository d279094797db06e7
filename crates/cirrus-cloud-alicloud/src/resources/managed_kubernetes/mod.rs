//! `alicloud_cs_managed_kubernetes`: a managed Kubernetes cluster whose
//! control plane is run by the container service.
//!
//! Create waits for the cluster to reach `running`, update only grows the
//! worker pool or renames the cluster, and read writes certificate and
//! kubeconfig material to the paths the configuration names.

pub mod args;
pub mod credentials;
pub mod nodes;

pub use args::{
    ManagedKubernetesConfig, build_creation_args, build_scale_args, deduplicate_instance_types,
    scale_delta,
};
pub use nodes::WorkerNode;

use crate::client::AlicloudClient;
use crate::codes::{CLUSTER_GONE, ERROR_CLUSTER_NAME_ALREADY_EXIST};
use crate::cs::{ClusterState, CsService};
use async_trait::async_trait;
use cirrus_cloud::{
    CloudError, ErrorClass, Resource, ResourceData, Result, RetryError, RetryPolicy, classify,
    retry,
};
use std::time::Duration;
use tracing::{debug, info};

pub const RESOURCE_TYPE: &str = "alicloud_cs_managed_kubernetes";

const CLUSTER_WAIT: Duration = Duration::from_secs(3600);
const DELETE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DELETING_PAUSE: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
pub struct ManagedKubernetes;

fn is_cluster_gone(err: &CloudError) -> bool {
    classify(err, &[], CLUSTER_GONE) == ErrorClass::NotFound
}

#[async_trait]
impl Resource<AlicloudClient> for ManagedKubernetes {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let config: ManagedKubernetesConfig = data.decode()?;
        config.validate()?;

        let args = build_creation_args(&config, client)
            .await
            .map_err(|e| e.wrap(RESOURCE_TYPE, "DescribeVSwitchAttributes"))?;

        let response = client
            .invoker()
            .run(|| client.cs().create_kubernetes_cluster(client.region_id(), &args))
            .await
            .map_err(|e| e.wrap(RESOURCE_TYPE, "CreateKubernetesCluster"))?;

        info!(cluster_id = %response.cluster_id, name = %args.name, "creating managed kubernetes cluster");
        data.set_id(response.cluster_id.clone());

        CsService::new(client)
            .wait_for_cluster(&response.cluster_id, ClusterState::Running, CLUSTER_WAIT)
            .await
            .map_err(|e| e.wrap(RESOURCE_TYPE, "WaitForCluster"))?;

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let id = data.id().to_string();

        let cluster = match CsService::new(client).describe_cluster(&id).await {
            Ok(cluster) => cluster,
            Err(e) if is_cluster_gone(&e) => {
                debug!(cluster_id = %id, "cluster is gone");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.wrap(RESOURCE_TYPE, "DescribeCluster")),
        };

        data.set("name", &cluster.name)?;
        data.set("vpc_id", &cluster.vpc_id)?;
        data.set("security_group_id", &cluster.security_group_id)?;
        data.set("availability_zone", &cluster.zone_id)?;

        let worker_nodes = nodes::fetch_worker_nodes(client, &id)
            .await
            .map_err(|e| e.wrap(RESOURCE_TYPE, "GetClusterNodes"))?;
        data.set("worker_nodes", worker_nodes)?;

        let config: ManagedKubernetesConfig = data.decode()?;
        credentials::write_credentials(client, &id, &config)
            .await
            .map_err(|e| e.wrap(RESOURCE_TYPE, "GetClusterCredentials"))
    }

    async fn update(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let id = data.id().to_string();
        let config: ManagedKubernetesConfig = data.decode()?;
        config.validate()?;

        data.begin_partial();

        if let Some(count) = scale_delta(data)? {
            let args = build_scale_args(&config, count);
            client
                .invoker()
                .run(|| client.cs().scale_kubernetes_cluster(&id, &args))
                .await
                .map_err(|e| e.wrap(RESOURCE_TYPE, "ScaleCluster"))?;

            info!(cluster_id = %id, count, "scaling out managed kubernetes cluster");
            CsService::new(client)
                .wait_for_cluster(&id, ClusterState::Running, CLUSTER_WAIT)
                .await
                .map_err(|e| e.wrap(RESOURCE_TYPE, "WaitForCluster"))?;

            data.set_partial("worker_number");
            data.set_partial("worker_numbers");
        }

        if data.has_change("name") || data.has_change("name_prefix") {
            let name = config.cluster_name();
            let renamed = client
                .invoker()
                .run(|| client.cs().modify_cluster_name(&id, &name))
                .await;
            match renamed {
                Ok(()) => info!(cluster_id = %id, name = %name, "renamed cluster"),
                Err(e) if e.matches_any(&[ERROR_CLUSTER_NAME_ALREADY_EXIST]) => {
                    debug!(cluster_id = %id, name = %name, "cluster already has this name");
                }
                Err(e) => return Err(e.wrap(RESOURCE_TYPE, "ModifyClusterName")),
            }

            data.set_partial("name");
            data.set_partial("name_prefix");
        }

        data.end_partial();
        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let id = data.id().to_string();
        let service = CsService::new(client);

        retry(
            &RetryPolicy::with_timeout(DELETE_TIMEOUT),
            "DeleteCluster",
            || async {
                match client.invoker().run(|| client.cs().delete_cluster(&id)).await {
                    Ok(()) => {}
                    Err(e) if is_cluster_gone(&e) => return Ok(()),
                    Err(e) => return Err(RetryError::Retryable(e)),
                }

                let cluster = match service.describe_cluster(&id).await {
                    Ok(cluster) => cluster,
                    Err(e) if is_cluster_gone(&e) => return Ok(()),
                    Err(e) => return Err(RetryError::NonRetryable(e)),
                };
                if cluster.cluster_id.is_empty() {
                    return Ok(());
                }

                if cluster.state == ClusterState::Deleting {
                    tokio::time::sleep(DELETING_PAUSE).await;
                }
                Err(RetryError::Retryable(CloudError::UnexpectedState(format!(
                    "cluster {id} is still {}",
                    cluster.state
                ))))
            },
        )
        .await
        .map_err(|e| e.wrap(RESOURCE_TYPE, "DeleteCluster"))?;

        info!(cluster_id = %id, "deleted managed kubernetes cluster");
        data.clear_id();
        Ok(())
    }
}
