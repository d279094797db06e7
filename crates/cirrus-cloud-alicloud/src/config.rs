//! Provider configuration

use cirrus_cloud::{CloudError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CLI_PATH: &str = "aliyun";

/// Page size used when listing cluster nodes
pub const PAGE_SIZE_LARGE: u32 = 50;

/// Configuration for the Alibaba Cloud provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlicloudConfig {
    /// Region every request is sent to (e.g., "cn-hangzhou")
    pub region_id: String,

    /// aliyun CLI profile holding the credentials
    #[serde(default)]
    pub profile: Option<String>,

    /// Path of the aliyun CLI binary
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_cli_path() -> String {
    DEFAULT_CLI_PATH.to_string()
}

fn default_page_size() -> u32 {
    PAGE_SIZE_LARGE
}

impl AlicloudConfig {
    pub fn new(region_id: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            profile: None,
            cli_path: default_cli_path(),
            page_size: default_page_size(),
        }
    }

    /// Create AlicloudConfig from environment variables
    ///
    /// - `ALICLOUD_REGION` (or `ALICLOUD_REGION_ID`): required
    /// - `ALICLOUD_PROFILE`: optional CLI profile
    /// - `ALIYUN_CLI_PATH`: optional CLI binary path
    pub fn from_env() -> Result<Self> {
        let region_id = std::env::var("ALICLOUD_REGION")
            .or_else(|_| std::env::var("ALICLOUD_REGION_ID"))
            .map_err(|_| {
                CloudError::InvalidConfig(
                    "ALICLOUD_REGION or ALICLOUD_REGION_ID must be set".to_string(),
                )
            })?;

        let mut config = Self::new(region_id);
        config.profile = std::env::var("ALICLOUD_PROFILE").ok().filter(|p| !p.is_empty());
        if let Ok(path) = std::env::var("ALIYUN_CLI_PATH") {
            config.cli_path = path;
        }
        Ok(config)
    }
}
