//! Alibaba Cloud provider implementation

use crate::client::AlicloudClient;
use crate::config::AlicloudConfig;
use crate::resources::{CenRouteEntry, ManagedKubernetes};
use async_trait::async_trait;
use cirrus_cloud::{
    AuthStatus, CloudError, CloudProvider, Operation, Resource, ResourceData, Result, dispatch,
    provider::unknown_resource_type,
};

/// Alibaba Cloud provider
pub struct AlicloudProvider {
    client: AlicloudClient,
    resources: Vec<Box<dyn Resource<AlicloudClient>>>,
}

impl AlicloudProvider {
    pub fn new(client: AlicloudClient) -> Self {
        Self {
            client,
            resources: vec![Box::new(CenRouteEntry), Box::new(ManagedKubernetes)],
        }
    }

    /// Provider backed by the `aliyun` CLI
    pub fn from_config(config: &AlicloudConfig) -> Self {
        Self::new(AlicloudClient::from_config(config))
    }

    pub fn client(&self) -> &AlicloudClient {
        &self.client
    }

    fn handler(&self, resource_type: &str) -> Result<&dyn Resource<AlicloudClient>> {
        self.resources
            .iter()
            .find(|r| r.type_name() == resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| unknown_resource_type(self.name(), resource_type))
    }
}

#[async_trait]
impl CloudProvider for AlicloudProvider {
    fn name(&self) -> &str {
        "alicloud"
    }

    fn display_name(&self) -> &str {
        "Alibaba Cloud"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        match self.client.sts().get_caller_identity().await {
            Ok(identity) => Ok(AuthStatus::ok(format!(
                "{} ({})",
                identity.arn, identity.account_id
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    fn resource_types(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.type_name()).collect()
    }

    async fn apply(
        &self,
        operation: Operation,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<()> {
        let handler = self.handler(resource_type)?;
        dispatch(handler, operation, data, &self.client).await
    }

    async fn import(&self, resource_type: &str, id: &str) -> Result<ResourceData> {
        let handler = self.handler(resource_type)?;
        let mut data = handler.import(id);
        handler.read(&mut data, &self.client).await?;

        if data.is_gone() {
            return Err(CloudError::ResourceNotFound(format!("{resource_type} {id}")));
        }
        Ok(data)
    }
}
