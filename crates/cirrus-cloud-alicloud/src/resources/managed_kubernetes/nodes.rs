//! Worker node listing

use crate::client::AlicloudClient;
use crate::cs::{CsService, KubernetesNode, NodePage};
use cirrus_cloud::{CloudError, Result, RetryError, RetryPolicy, retry};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NODE_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const NODE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Computed `worker_nodes` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerNode {
    pub id: String,
    pub name: String,
    pub private_ip: String,
}

impl From<KubernetesNode> for WorkerNode {
    fn from(node: KubernetesNode) -> Self {
        Self {
            id: node.instance_id,
            name: node.instance_name,
            private_ip: node.ip_address.into_iter().next().unwrap_or_default(),
        }
    }
}

/// List every worker node of a cluster.
///
/// Right after creation or scaling the first page can come back empty or
/// with nodes that have no instance yet. That page is polled until it fills
/// in or the cluster settles in a node-stable state, after which whatever
/// the last poll returned is accepted.
pub async fn fetch_worker_nodes(
    client: &AlicloudClient,
    cluster_id: &str,
) -> Result<Vec<WorkerNode>> {
    let page_size = client.page_size();
    let mut nodes = Vec::new();
    let mut page_number = 1;

    loop {
        let mut page = get_page(client, cluster_id, page_number, page_size).await?;
        if page_number == 1 && !page.is_populated() {
            page = poll_first_page(client, cluster_id, page_size).await?;
        }

        let count = page.nodes.len();
        let reported_size = match page.page.page_size {
            0 => page_size,
            n => n,
        };
        tracing::debug!(cluster_id, page_number, count, "GetClusterNodes");
        nodes.extend(page.nodes.into_iter().map(WorkerNode::from));

        if count == 0 || count < reported_size as usize {
            break;
        }
        page_number += 1;
    }

    Ok(nodes)
}

async fn get_page(
    client: &AlicloudClient,
    cluster_id: &str,
    page_number: u32,
    page_size: u32,
) -> Result<NodePage> {
    client
        .invoker()
        .run(|| client.cs().get_cluster_nodes(cluster_id, page_number, page_size))
        .await
}

async fn poll_first_page(
    client: &AlicloudClient,
    cluster_id: &str,
    page_size: u32,
) -> Result<NodePage> {
    let policy = RetryPolicy {
        timeout: NODE_POLL_TIMEOUT,
        initial_delay: NODE_POLL_INTERVAL,
        max_delay: NODE_POLL_INTERVAL,
        backoff_multiplier: 1.0,
    };

    retry(&policy, "GetClusterNodes", || async {
        let page = get_page(client, cluster_id, 1, page_size)
            .await
            .map_err(RetryError::NonRetryable)?;
        if page.is_populated() {
            return Ok(page);
        }

        let cluster = CsService::new(client)
            .describe_cluster(cluster_id)
            .await
            .map_err(RetryError::NonRetryable)?;
        // The node list no longer changes on its own
        if cluster.state.is_node_stable() {
            return Ok(page);
        }

        Err(RetryError::Retryable(CloudError::UnexpectedState(format!(
            "no worker nodes in cluster {cluster_id} yet (state {})",
            cluster.state
        ))))
    })
    .await
}
