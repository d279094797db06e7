//! VPC API surface used by the handlers

use async_trait::async_trait;
use cirrus_cloud::Result;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn describe_vswitch(&self, vswitch_id: &str) -> Result<VSwitch>;

    async fn describe_route_table(&self, route_table_id: &str) -> Result<RouteTable>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VSwitch {
    #[serde(rename = "VSwitchId")]
    pub vswitch_id: String,
    pub vpc_id: String,
    pub zone_id: String,
    pub cidr_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteTable {
    pub route_table_id: String,
    /// VRouter or VBR that owns the table
    pub router_id: String,
    /// "VRouter" or "VBR"
    pub router_type: String,
    pub vpc_id: String,
}

impl RouteTable {
    /// Whether the table belongs to a virtual border router
    pub fn is_vbr(&self) -> bool {
        self.router_type == "VBR" || self.router_id.starts_with("vbr")
    }
}
