//! Caller identity, used to check that credentials work

use async_trait::async_trait;
use cirrus_cloud::Result;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait StsApi: Send + Sync {
    async fn get_caller_identity(&self) -> Result<CallerIdentity>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
    pub user_id: String,
    pub identity_type: String,
}
