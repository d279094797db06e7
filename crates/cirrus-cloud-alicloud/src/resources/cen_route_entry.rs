//! `alicloud_cen_route_entry`: publishes a route of a VPC or VBR route table
//! to a CEN instance.

use crate::cen::{CenService, PublishStatus};
use crate::client::AlicloudClient;
use crate::codes::{PUBLISH_RETRYABLE, ROUTE_GONE, WITHDRAW_RETRYABLE};
use async_trait::async_trait;
use cirrus_cloud::{
    Resource, ResourceData, Result, RetryPolicy, composite_id, parse_composite_id,
    retry_classified,
};
use serde::Deserialize;
use std::time::Duration;

pub const RESOURCE_TYPE: &str = "alicloud_cen_route_entry";

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(3 * 60);
const WITHDRAW_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const PUBLISHED_WAIT: Duration = Duration::from_secs(60);
const DELETED_WAIT: Duration = Duration::from_secs(180);

#[derive(Debug, Deserialize)]
struct RouteEntryConfig {
    instance_id: String,
    route_table_id: String,
    cidr_block: String,
}

#[derive(Debug, Default)]
pub struct CenRouteEntry;

#[async_trait]
impl Resource<AlicloudClient> for CenRouteEntry {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let config: RouteEntryConfig = data.decode()?;
        let service = CenService::new(client);

        let request = service
            .route_entry_request(&config.instance_id, &config.route_table_id, &config.cidr_block)
            .await
            .map_err(|e| e.wrap(RESOURCE_TYPE, "DescribeRouteTableList"))?;

        retry_classified(
            &RetryPolicy::with_timeout(PUBLISH_TIMEOUT),
            "PublishRouteEntries",
            PUBLISH_RETRYABLE,
            &[],
            || client.cen().publish_route_entries(&request),
        )
        .await
        .map_err(|e| e.wrap(RESOURCE_TYPE, "PublishRouteEntries"))?;

        let id = composite_id(&[
            config.instance_id.as_str(),
            config.route_table_id.as_str(),
            config.cidr_block.as_str(),
        ]);
        tracing::info!(id = %id, "published CEN route entry");
        data.set_id(id.clone());

        service
            .wait_for_route_entry(&id, PublishStatus::Published, PUBLISHED_WAIT)
            .await?;

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let id = data.id().to_string();
        let parts = parse_composite_id(&id, 3)?;

        let entry = match CenService::new(client).describe_route_entry(&id).await {
            Ok(entry) => entry,
            Err(e) if e.is_not_found() => {
                tracing::debug!(id = %id, "route entry is gone");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.wrap(RESOURCE_TYPE, "DescribePublishedRouteEntries")),
        };

        if entry.publish_status == PublishStatus::NonPublished {
            tracing::debug!(id = %id, "route entry is no longer published");
            data.clear_id();
            return Ok(());
        }

        data.set("instance_id", parts[0])?;
        data.set("route_table_id", entry.child_instance_route_table_id)?;
        data.set("cidr_block", entry.destination_cidr_block)?;
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData, client: &AlicloudClient) -> Result<()> {
        let id = data.id().to_string();
        let parts = parse_composite_id(&id, 3)?;
        let service = CenService::new(client);

        let request = match service.route_entry_request(parts[0], parts[1], parts[2]).await {
            Ok(request) => request,
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.wrap(RESOURCE_TYPE, "DescribeRouteTableList")),
        };

        let withdrawn = retry_classified(
            &RetryPolicy::with_timeout(WITHDRAW_TIMEOUT),
            "WithdrawPublishedRouteEntries",
            WITHDRAW_RETRYABLE,
            ROUTE_GONE,
            || client.cen().withdraw_published_route_entries(&request),
        )
        .await;

        match withdrawn {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(id = %id, error = %e, "route entry already withdrawn");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.wrap(RESOURCE_TYPE, "WithdrawPublishedRouteEntries")),
        }

        service
            .wait_for_route_entry(&id, PublishStatus::Deleted, DELETED_WAIT)
            .await?;

        tracing::info!(id = %id, "withdrew CEN route entry");
        data.clear_id();
        Ok(())
    }
}
