//! Alibaba Cloud error codes and message fragments the handlers react to.

use cirrus_cloud::{Catcher, Invoker};
use std::time::Duration;

pub const OPERATION_BLOCKING: &str = "Operation.Blocking";
pub const INVALID_STATE_FOR_OPERATION_MSG: &str = "not in a valid state for the operation";
pub const INVALID_CEN_INSTANCE_STATUS: &str = "InvalidOperation.CenInstanceStatus";
pub const INTERNAL_ERROR: &str = "InternalError";
pub const NOT_FOUND_ROUTE: &str = "InvalidOperation.NotFoundRoute";
pub const INSTANCE_NOT_EXIST_MSG: &str = "The specified instance does not exist";

pub const INVALID_ROUTE_TABLE_ID_NOT_FOUND: &str = "InvalidRouteTableId.NotFound";
pub const INVALID_VSWITCH_ID_NOT_FOUND: &str = "InvalidVSwitchId.NotFound";

pub const ERROR_CLUSTER_NOT_FOUND: &str = "ErrorClusterNotFound";
pub const ERROR_CLUSTER_NAME_ALREADY_EXIST: &str = "ErrorClusterNameAlreadyExist";

pub const THROTTLING: &str = "Throttling";
pub const THROTTLING_USER: &str = "Throttling.User";
pub const THROTTLING_API: &str = "Throttling.Api";
pub const SERVICE_UNAVAILABLE: &str = "ServiceUnavailable";
pub const SYSTEM_BUSY: &str = "SystemBusy";
pub const SERVICE_BUSY: &str = "Service.Busy";

/// Retryable while publishing a route entry
pub const PUBLISH_RETRYABLE: &[&str] = &[OPERATION_BLOCKING, INVALID_STATE_FOR_OPERATION_MSG];

/// Retryable while withdrawing a route entry
pub const WITHDRAW_RETRYABLE: &[&str] = &[INVALID_CEN_INSTANCE_STATUS, INTERNAL_ERROR];

/// A withdraw failing with one of these means the route is already gone
pub const ROUTE_GONE: &[&str] = &[NOT_FOUND_ROUTE, INSTANCE_NOT_EXIST_MSG];

/// VPC lookups failing with one of these mean the route table or vswitch is gone
pub const VPC_GONE: &[&str] = &[INVALID_ROUTE_TABLE_ID_NOT_FOUND, INVALID_VSWITCH_ID_NOT_FOUND];

/// Cluster calls failing with one of these mean the cluster is gone
pub const CLUSTER_GONE: &[&str] = &[ERROR_CLUSTER_NOT_FOUND];

/// Invoker wrapped around container service calls
pub fn default_invoker() -> Invoker {
    Invoker::new(vec![
        Catcher::new(
            &[THROTTLING, THROTTLING_USER, THROTTLING_API],
            10,
            Duration::from_secs(2),
        ),
        Catcher::new(
            &[SERVICE_UNAVAILABLE, SYSTEM_BUSY, SERVICE_BUSY],
            5,
            Duration::from_secs(3),
        ),
    ])
}
