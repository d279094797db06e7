//! Client handle shared by every resource handler

use crate::aliyun::AliyunCli;
use crate::cen::CenApi;
use crate::codes::default_invoker;
use crate::config::AlicloudConfig;
use crate::cs::CsApi;
use crate::sts::StsApi;
use crate::vpc::VpcApi;
use cirrus_cloud::Invoker;
use std::sync::Arc;

/// Region-bound handle to the Alibaba Cloud APIs.
///
/// Cloning is cheap; every API group is an `Arc` to the same backend.
#[derive(Clone)]
pub struct AlicloudClient {
    region_id: String,
    page_size: u32,
    cen: Arc<dyn CenApi>,
    cs: Arc<dyn CsApi>,
    vpc: Arc<dyn VpcApi>,
    sts: Arc<dyn StsApi>,
    invoker: Invoker,
}

impl AlicloudClient {
    /// Build a client whose API groups are all served by `api`
    pub fn new<A>(config: &AlicloudConfig, api: Arc<A>) -> Self
    where
        A: CenApi + CsApi + VpcApi + StsApi + 'static,
    {
        Self {
            region_id: config.region_id.clone(),
            page_size: config.page_size,
            cen: api.clone(),
            cs: api.clone(),
            vpc: api.clone(),
            sts: api,
            invoker: default_invoker(),
        }
    }

    /// Client backed by the `aliyun` command-line tool
    pub fn from_config(config: &AlicloudConfig) -> Self {
        Self::new(config, Arc::new(AliyunCli::from_config(config)))
    }

    pub fn with_invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cen(&self) -> &dyn CenApi {
        self.cen.as_ref()
    }

    pub fn cs(&self) -> &dyn CsApi {
        self.cs.as_ref()
    }

    pub fn vpc(&self) -> &dyn VpcApi {
        self.vpc.as_ref()
    }

    pub fn sts(&self) -> &dyn StsApi {
        self.sts.as_ref()
    }

    /// Transient-fault wrapper for container service calls
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }
}

impl std::fmt::Debug for AlicloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlicloudClient")
            .field("region_id", &self.region_id)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
