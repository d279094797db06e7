//! Cloud provider and resource lifecycle traits

use crate::error::{CloudError, Result};
use crate::resource::ResourceData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifecycle contract for one resource type.
///
/// `C` is the client handle the provider injects into every call. Handlers
/// keep no state of their own between calls.
#[async_trait]
pub trait Resource<C: ?Sized + Sync>: Send + Sync {
    /// Resource type name (e.g., "alicloud_cen_route_entry")
    fn type_name(&self) -> &'static str;

    /// Create the remote object and record its id
    async fn create(&self, data: &mut ResourceData, client: &C) -> Result<()>;

    /// Refresh attributes from the remote object; clears the id when it is gone
    async fn read(&self, data: &mut ResourceData, client: &C) -> Result<()>;

    /// Apply in-place changes. Types whose attributes all force replacement
    /// only need a read-back here.
    async fn update(&self, data: &mut ResourceData, client: &C) -> Result<()> {
        self.read(data, client).await
    }

    /// Destroy the remote object. Absent objects are not an error.
    async fn delete(&self, data: &mut ResourceData, client: &C) -> Result<()>;

    /// Import passthrough of an existing identifier
    fn import(&self, id: &str) -> ResourceData {
        ResourceData::imported(id)
    }
}

/// Cloud provider abstraction trait
///
/// A provider owns the client for one cloud and dispatches lifecycle calls
/// from the host to its resource handlers.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "alicloud")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Resource types this provider can manage
    fn resource_types(&self) -> Vec<&'static str>;

    /// Run one lifecycle operation against a resource
    async fn apply(
        &self,
        operation: Operation,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<()>;

    /// Import an existing resource by id, then read it
    async fn import(&self, resource_type: &str, id: &str) -> Result<ResourceData>;
}

/// Lifecycle operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Run `operation` on a handler.
pub async fn dispatch<C: ?Sized + Sync>(
    handler: &dyn Resource<C>,
    operation: Operation,
    data: &mut ResourceData,
    client: &C,
) -> Result<()> {
    tracing::debug!(
        resource_type = handler.type_name(),
        id = data.id(),
        %operation,
        "dispatching lifecycle call"
    );
    match operation {
        Operation::Create => handler.create(data, client).await,
        Operation::Read => handler.read(data, client).await,
        Operation::Update => handler.update(data, client).await,
        Operation::Delete => handler.delete(data, client).await,
    }
}

/// Error for a resource type no handler is registered for.
pub fn unknown_resource_type(provider: &str, resource_type: &str) -> CloudError {
    CloudError::InvalidConfig(format!(
        "provider {provider} does not manage resource type {resource_type}"
    ))
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
