//! Alibaba Cloud provider for Cirrus
//!
//! This crate implements the CloudProvider trait for Alibaba Cloud and the
//! resource handlers it dispatches to.
//!
//! # Resources
//!
//! - `alicloud_cen_route_entry`: publish a VPC or VBR route to a CEN instance
//! - `alicloud_cs_managed_kubernetes`: managed Kubernetes clusters
//!
//! # Requirements
//!
//! - `aliyun` CLI must be installed and configured
//! - Authentication is managed through the aliyun CLI profile
//!
//! # Example
//!
//! ```ignore
//! use cirrus_cloud::{CloudProvider, Operation, ResourceData, attributes};
//! use cirrus_cloud_alicloud::{AlicloudConfig, AlicloudProvider};
//! use serde_json::json;
//!
//! let provider = AlicloudProvider::from_config(&AlicloudConfig::from_env()?);
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let mut data = ResourceData::new(attributes(json!({
//!     "instance_id": "cen-1",
//!     "route_table_id": "vtb-1",
//!     "cidr_block": "10.0.0.0/16",
//! })));
//! provider
//!     .apply(Operation::Create, "alicloud_cen_route_entry", &mut data)
//!     .await?;
//! ```

pub mod aliyun;
pub mod cen;
pub mod client;
pub mod codes;
pub mod config;
pub mod cs;
pub mod error;
pub mod provider;
pub mod resources;
pub mod sts;
pub mod vpc;

pub use aliyun::AliyunCli;
pub use cen::{CenApi, CenService, PublishStatus, PublishedRouteEntry, RouteEntryRequest};
pub use client::AlicloudClient;
pub use config::AlicloudConfig;
pub use cs::{Cluster, ClusterState, CsApi, CsService};
pub use error::{AliyunError, Result};
pub use provider::AlicloudProvider;
pub use resources::{CenRouteEntry, ManagedKubernetes};
pub use sts::{CallerIdentity, StsApi};
pub use vpc::{RouteTable, VSwitch, VpcApi};
