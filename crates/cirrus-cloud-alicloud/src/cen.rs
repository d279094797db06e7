//! Cloud Enterprise Network (CEN) API surface and route-entry helpers

use crate::client::AlicloudClient;
use crate::codes::VPC_GONE;
use async_trait::async_trait;
use cirrus_cloud::{CloudError, Progress, Result, Waiter, parse_composite_id};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll interval while waiting on a route entry
pub const DEFAULT_INTERVAL_SHORT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait CenApi: Send + Sync {
    async fn publish_route_entries(&self, request: &RouteEntryRequest) -> Result<()>;

    async fn withdraw_published_route_entries(&self, request: &RouteEntryRequest) -> Result<()>;

    async fn describe_published_route_entries(
        &self,
        request: &RouteEntryRequest,
    ) -> Result<Vec<PublishedRouteEntry>>;
}

/// Publish state of a route entry on a CEN route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PublishStatus {
    NonPublished,
    Publishing,
    Published,
    Withdrawing,
    Deleted,
    Other(String),
}

impl PublishStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PublishStatus::NonPublished => "NonPublished",
            PublishStatus::Publishing => "Publishing",
            PublishStatus::Published => "Published",
            PublishStatus::Withdrawing => "Withdrawing",
            PublishStatus::Deleted => "Deleted",
            PublishStatus::Other(s) => s,
        }
    }
}

impl From<String> for PublishStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NonPublished" => PublishStatus::NonPublished,
            "Publishing" => PublishStatus::Publishing,
            "Published" => PublishStatus::Published,
            "Withdrawing" => PublishStatus::Withdrawing,
            "Deleted" => PublishStatus::Deleted,
            _ => PublishStatus::Other(s),
        }
    }
}

impl From<PublishStatus> for String {
    fn from(status: PublishStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of network instance a route table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildInstanceType {
    Vpc,
    Vbr,
}

impl ChildInstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildInstanceType::Vpc => "VPC",
            ChildInstanceType::Vbr => "VBR",
        }
    }
}

/// Addresses one route entry on a child instance's route table.
///
/// The same request shape drives publish, withdraw and describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntryRequest {
    pub cen_id: String,
    pub child_instance_id: String,
    pub child_instance_type: ChildInstanceType,
    pub child_instance_region_id: String,
    pub child_instance_route_table_id: String,
    pub destination_cidr_block: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublishedRouteEntry {
    pub destination_cidr_block: String,
    pub child_instance_route_table_id: String,
    pub publish_status: PublishStatus,
    #[serde(default)]
    pub route_type: String,
    #[serde(default)]
    pub next_hop_type: String,
    #[serde(default)]
    pub next_hop_id: String,
}

/// Higher-level route-entry operations over the raw CEN and VPC calls
pub struct CenService<'a> {
    client: &'a AlicloudClient,
}

impl<'a> CenService<'a> {
    pub fn new(client: &'a AlicloudClient) -> Self {
        Self { client }
    }

    /// Resolve the instance owning `route_table_id`: the VBR itself for a
    /// border-router table, otherwise the VPC of the VRouter.
    pub async fn child_instance(&self, route_table_id: &str) -> Result<(String, ChildInstanceType)> {
        let table = self
            .client
            .vpc()
            .describe_route_table(route_table_id)
            .await
            .map_err(|e| e.not_found_on(VPC_GONE))?;
        if table.is_vbr() {
            return Ok((table.router_id, ChildInstanceType::Vbr));
        }
        if table.vpc_id.is_empty() {
            return Err(CloudError::ResourceNotFound(format!(
                "VPC of route table {route_table_id}"
            )));
        }
        Ok((table.vpc_id, ChildInstanceType::Vpc))
    }

    pub async fn route_entry_request(
        &self,
        cen_id: &str,
        route_table_id: &str,
        cidr_block: &str,
    ) -> Result<RouteEntryRequest> {
        let (child_instance_id, child_instance_type) = self.child_instance(route_table_id).await?;
        Ok(RouteEntryRequest {
            cen_id: cen_id.to_string(),
            child_instance_id,
            child_instance_type,
            child_instance_region_id: self.client.region_id().to_string(),
            child_instance_route_table_id: route_table_id.to_string(),
            destination_cidr_block: cidr_block.to_string(),
        })
    }

    /// Describe the route entry behind a `cen:vtb:cidr` identifier.
    pub async fn describe_route_entry(&self, id: &str) -> Result<PublishedRouteEntry> {
        let parts = parse_composite_id(id, 3)?;
        let request = self.route_entry_request(parts[0], parts[1], parts[2]).await?;

        let entries = self
            .client
            .cen()
            .describe_published_route_entries(&request)
            .await?;

        tracing::debug!(id, count = entries.len(), "DescribePublishedRouteEntries");

        entries
            .into_iter()
            .find(|e| e.destination_cidr_block == request.destination_cidr_block)
            .ok_or_else(|| CloudError::ResourceNotFound(format!("CEN route entry {id}")))
    }

    /// Wait until the route entry reports `status`. Waiting for
    /// [`PublishStatus::Deleted`] also succeeds once the entry is gone or
    /// listed as no longer published.
    pub async fn wait_for_route_entry(
        &self,
        id: &str,
        status: PublishStatus,
        timeout: Duration,
    ) -> Result<()> {
        let waiter = Waiter::new(format!("CEN route entry {id} -> {status}"), timeout)
            .interval(DEFAULT_INTERVAL_SHORT);

        if status == PublishStatus::Deleted {
            waiter
                .accept_absent()
                .until(
                    || self.describe_route_entry(id),
                    |entry: &PublishedRouteEntry| reached(Some(entry), &status),
                )
                .await?;
        } else {
            // Freshly published entries may not be listed yet.
            waiter
                .until(
                    || async {
                        match self.describe_route_entry(id).await {
                            Ok(entry) => Ok(Some(entry)),
                            Err(e) if e.is_not_found() => Ok(None),
                            Err(e) => Err(e),
                        }
                    },
                    |entry: &Option<PublishedRouteEntry>| reached(entry.as_ref(), &status),
                )
                .await?;
        }
        Ok(())
    }
}

fn reached(entry: Option<&PublishedRouteEntry>, status: &PublishStatus) -> Progress {
    match entry {
        Some(e) if &e.publish_status == status => Progress::Done,
        Some(e)
            if *status == PublishStatus::Deleted
                && e.publish_status == PublishStatus::NonPublished =>
        {
            Progress::Done
        }
        _ => Progress::Pending,
    }
}
