mod common;

use cirrus_cloud::{CloudError, CloudProvider, Operation, Resource, ResourceData, attributes};
use cirrus_cloud_alicloud::cen::{ChildInstanceType, PublishStatus};
use cirrus_cloud_alicloud::{AlicloudProvider, CenRouteEntry};
use common::{FakeCloud, client, init_tracing};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

const ROUTE_ID: &str = "cen-1:vtb-1:10.0.0.0/16";

fn fake_with_vpc_table() -> Arc<FakeCloud> {
    init_tracing();
    let fake = FakeCloud::new();
    fake.add_route_table("vtb-1", "vrt-1", "VRouter", "vpc-1");
    fake
}

fn route_config() -> ResourceData {
    ResourceData::new(attributes(json!({
        "instance_id": "cen-1",
        "route_table_id": "vtb-1",
        "cidr_block": "10.0.0.0/16",
    })))
}

#[tokio::test]
async fn test_create_publishes_route() {
    let fake = fake_with_vpc_table();
    let mut data = route_config();

    assert_ok!(CenRouteEntry.create(&mut data, &client(&fake)).await);

    assert_eq!(data.id(), ROUTE_ID);
    assert_eq!(data.get_str("instance_id"), Some("cen-1"));
    assert_eq!(data.get_str("route_table_id"), Some("vtb-1"));
    assert_eq!(data.get_str("cidr_block"), Some("10.0.0.0/16"));

    let requests = fake.state().publish_requests.clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].child_instance_id, "vpc-1");
    assert_eq!(requests[0].child_instance_type, ChildInstanceType::Vpc);
    assert_eq!(requests[0].child_instance_region_id, common::REGION);
}

#[tokio::test]
async fn test_create_on_border_router_table() {
    init_tracing();
    let fake = FakeCloud::new();
    fake.add_route_table("vtb-vbr", "vbr-7", "VBR", "");
    let mut data = ResourceData::new(attributes(json!({
        "instance_id": "cen-1",
        "route_table_id": "vtb-vbr",
        "cidr_block": "172.16.0.0/12",
    })));

    assert_ok!(CenRouteEntry.create(&mut data, &client(&fake)).await);

    let request = fake.state().publish_requests[0].clone();
    assert_eq!(request.child_instance_id, "vbr-7");
    assert_eq!(request.child_instance_type, ChildInstanceType::Vbr);
}

#[tokio::test(start_paused = true)]
async fn test_create_retries_blocked_publish() {
    let fake = fake_with_vpc_table();
    fake.fail_next(
        "PublishRouteEntries",
        CloudError::api("Operation.Blocking", "The operation is blocked."),
    );
    fake.fail_next(
        "PublishRouteEntries",
        CloudError::api(
            "IncorrectStatus",
            "The CEN instance is not in a valid state for the operation.",
        ),
    );
    let mut data = route_config();

    assert_ok!(CenRouteEntry.create(&mut data, &client(&fake)).await);

    assert_eq!(fake.count("PublishRouteEntries"), 3);
    assert_eq!(data.id(), ROUTE_ID);
}

#[tokio::test]
async fn test_create_fails_fast_on_fatal_error() {
    let fake = fake_with_vpc_table();
    fake.fail_next(
        "PublishRouteEntries",
        CloudError::api("Forbidden.RAM", "User not authorized"),
    );
    let mut data = route_config();

    let err = assert_err!(CenRouteEntry.create(&mut data, &client(&fake)).await);

    assert_eq!(err.code(), Some("Forbidden.RAM"));
    assert!(err.to_string().contains("PublishRouteEntries"));
    assert_eq!(fake.count("PublishRouteEntries"), 1);
    assert!(data.is_gone());
}

#[tokio::test(start_paused = true)]
async fn test_create_times_out_waiting_for_published() {
    let fake = fake_with_vpc_table();
    fake.state().publish_status = Some(PublishStatus::Publishing);
    let mut data = route_config();

    let err = assert_err!(CenRouteEntry.create(&mut data, &client(&fake)).await);

    assert!(matches!(err, CloudError::Timeout(_)));
    // The id is kept so the host can track the half-created route
    assert_eq!(data.id(), ROUTE_ID);
}

#[tokio::test]
async fn test_read_clears_unpublished_route() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::NonPublished);
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.read(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
}

#[tokio::test]
async fn test_read_clears_missing_route() {
    let fake = fake_with_vpc_table();
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.read(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
}

#[tokio::test]
async fn test_read_ipv6_route() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "2408:4000:1f::/56", PublishStatus::Published);
    let mut data = ResourceData::imported("cen-1:vtb-1:2408:4000:1f::/56");

    assert_ok!(CenRouteEntry.read(&mut data, &client(&fake)).await);

    assert!(!data.is_gone());
    assert_eq!(data.get_str("cidr_block"), Some("2408:4000:1f::/56"));
}

#[tokio::test]
async fn test_read_rejects_malformed_id() {
    let fake = fake_with_vpc_table();
    let mut data = ResourceData::imported("cen-1:vtb-1");

    let err = assert_err!(CenRouteEntry.read(&mut data, &client(&fake)).await);

    assert!(matches!(err, CloudError::InvalidId { expected: 3, .. }));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_delete_withdraws_route() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::Published);
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
    assert!(fake.state().routes.is_empty());
    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_accepts_route_left_unpublished() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::Published);
    fake.state().withdraw_leaves_unpublished = true;
    let mut data = ResourceData::imported(ROUTE_ID);
    let start = Instant::now();

    assert_ok!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 1);
    assert_eq!(
        fake.state().routes[0].1.publish_status,
        PublishStatus::NonPublished
    );
    assert_eq!(start.elapsed(), std::time::Duration::ZERO);
}

#[tokio::test]
async fn test_delete_already_withdrawn_route() {
    let fake = fake_with_vpc_table();
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 1);
}

#[tokio::test]
async fn test_delete_when_route_table_is_gone() {
    init_tracing();
    let fake = FakeCloud::new();
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 0);
}

#[tokio::test]
async fn test_delete_when_route_table_id_not_found() {
    let fake = fake_with_vpc_table();
    fake.fail_next(
        "DescribeRouteTableList",
        CloudError::api("InvalidRouteTableId.NotFound", "The route table is not found."),
    );
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert!(data.is_gone());
    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 0);
}

#[tokio::test]
async fn test_read_surfaces_credential_errors() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::Published);
    fake.fail_next(
        "DescribeRouteTableList",
        CloudError::api("InvalidAccessKeyId.NotFound", "Specified access key is not found."),
    );
    let mut data = ResourceData::imported(ROUTE_ID);

    let err = assert_err!(CenRouteEntry.read(&mut data, &client(&fake)).await);

    assert_eq!(err.code(), Some("InvalidAccessKeyId.NotFound"));
    assert_eq!(data.id(), ROUTE_ID);
}

#[tokio::test]
async fn test_delete_surfaces_credential_errors() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::Published);
    fake.fail_next(
        "DescribeRouteTableList",
        CloudError::api("InvalidAccessKeyId.NotFound", "Specified access key is not found."),
    );
    let mut data = ResourceData::imported(ROUTE_ID);

    let err = assert_err!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert_eq!(err.code(), Some("InvalidAccessKeyId.NotFound"));
    assert_eq!(data.id(), ROUTE_ID);
    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 0);
    assert_eq!(fake.state().routes.len(), 1);
}

#[tokio::test]
async fn test_delete_surfaces_withdraw_credential_errors() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::Published);
    fake.fail_next(
        "WithdrawPublishedRouteEntries",
        CloudError::api("InvalidAccessKeyId.NotFound", "Specified access key is not found."),
    );
    let mut data = ResourceData::imported(ROUTE_ID);

    let err = assert_err!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert_eq!(err.code(), Some("InvalidAccessKeyId.NotFound"));
    assert_eq!(data.id(), ROUTE_ID);
    assert_eq!(fake.state().routes.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_retries_busy_cen_instance() {
    let fake = fake_with_vpc_table();
    fake.add_route("cen-1", "vtb-1", "10.0.0.0/16", PublishStatus::Published);
    fake.fail_next(
        "WithdrawPublishedRouteEntries",
        CloudError::api("InvalidOperation.CenInstanceStatus", "CEN instance is busy"),
    );
    fake.fail_next(
        "WithdrawPublishedRouteEntries",
        CloudError::api("InternalError", "internal error"),
    );
    let mut data = ResourceData::imported(ROUTE_ID);

    assert_ok!(CenRouteEntry.delete(&mut data, &client(&fake)).await);

    assert_eq!(fake.count("WithdrawPublishedRouteEntries"), 3);
    assert!(data.is_gone());
}

#[tokio::test]
async fn test_provider_dispatch_and_import() {
    let fake = fake_with_vpc_table();
    let provider = AlicloudProvider::new(client(&fake));

    let mut data = route_config();
    assert_ok!(
        provider
            .apply(Operation::Create, "alicloud_cen_route_entry", &mut data)
            .await
    );

    let imported = assert_ok!(provider.import("alicloud_cen_route_entry", ROUTE_ID).await);
    assert_eq!(imported.get_str("instance_id"), Some("cen-1"));

    assert_ok!(
        provider
            .apply(Operation::Delete, "alicloud_cen_route_entry", &mut data)
            .await
    );
    let err = assert_err!(provider.import("alicloud_cen_route_entry", ROUTE_ID).await);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_provider_rejects_unknown_type() {
    let fake = fake_with_vpc_table();
    let provider = AlicloudProvider::new(client(&fake));
    let mut data = route_config();

    let err = assert_err!(provider.apply(Operation::Read, "alicloud_vpc", &mut data).await);

    assert!(matches!(err, CloudError::InvalidConfig(_)));
    assert_eq!(
        provider.resource_types(),
        vec!["alicloud_cen_route_entry", "alicloud_cs_managed_kubernetes"]
    );
}

#[tokio::test]
async fn test_provider_check_auth() {
    let fake = fake_with_vpc_table();
    let provider = AlicloudProvider::new(client(&fake));

    let status = assert_ok!(provider.check_auth().await);
    assert!(status.authenticated);
    assert!(status.account_info.unwrap().contains("1234567890"));

    fake.fail_next(
        "GetCallerIdentity",
        CloudError::api("InvalidAccessKeyId.NotFound", "Specified access key is not found."),
    );
    let status = assert_ok!(provider.check_auth().await);
    assert!(!status.authenticated);
}
