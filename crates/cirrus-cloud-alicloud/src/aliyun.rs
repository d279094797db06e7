//! aliyun CLI wrapper
//!
//! Drives the `aliyun` command-line tool for every API group the handlers
//! use. RPC-style products (cbn, vpc, sts) take `--Param value` pairs;
//! the container service is called ROA-style with a method, a path and an
//! optional JSON body.

use crate::cen::{CenApi, PublishedRouteEntry, RouteEntryRequest};
use crate::config::AlicloudConfig;
use crate::cs::{
    Cluster, ClusterCerts, ClusterConfig, ClusterCreationResponse, CsApi, KubernetesCreationArgs,
    KubernetesScaleArgs, NodePage,
};
use crate::error::{AliyunError, Result};
use crate::sts::{CallerIdentity, StsApi};
use crate::vpc::{RouteTable, VSwitch, VpcApi};
use async_trait::async_trait;
use cirrus_cloud::CloudError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

/// aliyun CLI wrapper
#[derive(Debug, Clone)]
pub struct AliyunCli {
    program: String,
    region_id: String,
    profile: Option<String>,
}

impl AliyunCli {
    pub fn from_config(config: &AlicloudConfig) -> Self {
        Self {
            program: config.cli_path.clone(),
            region_id: config.region_id.clone(),
            profile: config.profile.clone(),
        }
    }

    /// Run an aliyun command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.arg("--region").arg(&self.region_id);
        if let Some(profile) = &self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: {} {} --region {}",
            self.program,
            args.join(" "),
            self.region_id
        );

        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AliyunError::CliNotFound,
            _ => AliyunError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_cli_error(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// RPC-style call: `aliyun <product> <Action> --Key value ...`
    async fn rpc<T: DeserializeOwned>(
        &self,
        product: &str,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let flags: Vec<String> = params.iter().map(|(k, _)| format!("--{k}")).collect();
        let mut args = vec![product, action];
        for (flag, (_, value)) in flags.iter().zip(params) {
            args.push(flag.as_str());
            args.push(*value);
        }

        let output = self.run_command(&args).await?;
        parse_output(&output)
    }

    /// ROA-style call: `aliyun cs <METHOD> <path> [--body json]`
    async fn roa<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let body = body.map(serde_json::to_string).transpose()?;
        let mut args = vec!["cs", method, path];
        if let Some(ref body) = body {
            args.extend(["--header", "Content-Type=application/json", "--body", body.as_str()]);
        }

        let output = self.run_command(&args).await?;
        parse_output(&output)
    }
}

/// Decode CLI output; ROA calls with no response body decode from `null`.
fn parse_output<T: DeserializeOwned>(output: &str) -> Result<T> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Extract the vendor error from CLI stderr.
///
/// The CLI prints server errors as `ErrorCode:` / `Message:` /
/// `RequestId:` lines; ROA errors sometimes come back as a JSON body instead.
fn parse_cli_error(stderr: &str) -> AliyunError {
    let mut code = None;
    let mut message = None;
    let mut request_id = None;

    for line in stderr.lines() {
        let line = line.trim();
        if let Some(v) = line.strip_prefix("ErrorCode:") {
            code = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Message:") {
            message = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("RequestId:") {
            request_id = Some(v.trim().to_string());
        }
    }

    if code.is_none() {
        if let Some(start) = stderr.find('{') {
            if let Ok(body) = serde_json::from_str::<Value>(&stderr[start..]) {
                code = body
                    .get("code")
                    .or_else(|| body.get("Code"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                message = body
                    .get("message")
                    .or_else(|| body.get("Message"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                request_id = body
                    .get("requestId")
                    .or_else(|| body.get("RequestId"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
        }
    }

    match code {
        Some(code) => AliyunError::Api {
            code,
            message: message.unwrap_or_default(),
            request_id,
        },
        None => AliyunError::CommandFailed(stderr.trim().to_string()),
    }
}

fn route_entry_params(request: &RouteEntryRequest) -> [(&'static str, &str); 6] {
    [
        ("CenId", request.cen_id.as_str()),
        ("ChildInstanceId", request.child_instance_id.as_str()),
        ("ChildInstanceType", request.child_instance_type.as_str()),
        ("ChildInstanceRegionId", request.child_instance_region_id.as_str()),
        (
            "ChildInstanceRouteTableId",
            request.child_instance_route_table_id.as_str(),
        ),
        ("DestinationCidrBlock", request.destination_cidr_block.as_str()),
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribePublishedRouteEntriesResponse {
    published_route_entries: PublishedRouteEntries,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PublishedRouteEntries {
    published_route_entry: Vec<PublishedRouteEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeRouteTableListResponse {
    router_table_list: RouterTableList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RouterTableList {
    router_table_list_type: Vec<RouteTable>,
}

#[async_trait]
impl CenApi for AliyunCli {
    async fn publish_route_entries(&self, request: &RouteEntryRequest) -> cirrus_cloud::Result<()> {
        let _: Value = self
            .rpc("cbn", "PublishRouteEntries", &route_entry_params(request))
            .await?;
        Ok(())
    }

    async fn withdraw_published_route_entries(
        &self,
        request: &RouteEntryRequest,
    ) -> cirrus_cloud::Result<()> {
        let _: Value = self
            .rpc("cbn", "WithdrawPublishedRouteEntries", &route_entry_params(request))
            .await?;
        Ok(())
    }

    async fn describe_published_route_entries(
        &self,
        request: &RouteEntryRequest,
    ) -> cirrus_cloud::Result<Vec<PublishedRouteEntry>> {
        let response: DescribePublishedRouteEntriesResponse = self
            .rpc(
                "cbn",
                "DescribePublishedRouteEntries",
                &route_entry_params(request),
            )
            .await?;
        Ok(response.published_route_entries.published_route_entry)
    }
}

#[async_trait]
impl VpcApi for AliyunCli {
    async fn describe_vswitch(&self, vswitch_id: &str) -> cirrus_cloud::Result<VSwitch> {
        let vswitch: VSwitch = self
            .rpc("vpc", "DescribeVSwitchAttributes", &[("VSwitchId", vswitch_id)])
            .await?;
        if vswitch.vswitch_id.is_empty() {
            return Err(CloudError::ResourceNotFound(format!("VSwitch {vswitch_id}")));
        }
        Ok(vswitch)
    }

    async fn describe_route_table(&self, route_table_id: &str) -> cirrus_cloud::Result<RouteTable> {
        let response: DescribeRouteTableListResponse = self
            .rpc("vpc", "DescribeRouteTableList", &[("RouteTableId", route_table_id)])
            .await?;
        response
            .router_table_list
            .router_table_list_type
            .into_iter()
            .find(|t| t.route_table_id == route_table_id)
            .ok_or_else(|| CloudError::ResourceNotFound(format!("route table {route_table_id}")))
    }
}

#[async_trait]
impl StsApi for AliyunCli {
    async fn get_caller_identity(&self) -> cirrus_cloud::Result<CallerIdentity> {
        Ok(self.rpc("sts", "GetCallerIdentity", &[]).await?)
    }
}

#[async_trait]
impl CsApi for AliyunCli {
    async fn create_kubernetes_cluster(
        &self,
        region_id: &str,
        args: &KubernetesCreationArgs,
    ) -> cirrus_cloud::Result<ClusterCreationResponse> {
        let mut body = serde_json::to_value(args)?;
        if let Value::Object(ref mut map) = body {
            map.insert("region_id".into(), Value::String(region_id.to_string()));
        }
        Ok(self.roa("POST", "/clusters", Some(&body)).await?)
    }

    async fn describe_cluster(&self, cluster_id: &str) -> cirrus_cloud::Result<Cluster> {
        Ok(self
            .roa("GET", &format!("/clusters/{cluster_id}"), None)
            .await?)
    }

    async fn scale_kubernetes_cluster(
        &self,
        cluster_id: &str,
        args: &KubernetesScaleArgs,
    ) -> cirrus_cloud::Result<()> {
        let body = serde_json::to_value(args)?;
        let _: Value = self
            .roa("PUT", &format!("/api/v2/clusters/{cluster_id}"), Some(&body))
            .await?;
        Ok(())
    }

    async fn modify_cluster_name(&self, cluster_id: &str, name: &str) -> cirrus_cloud::Result<()> {
        let body = serde_json::json!({ "name": name });
        let _: Value = self
            .roa("PUT", &format!("/clusters/{cluster_id}"), Some(&body))
            .await?;
        Ok(())
    }

    async fn get_cluster_nodes(
        &self,
        cluster_id: &str,
        page_number: u32,
        page_size: u32,
    ) -> cirrus_cloud::Result<NodePage> {
        let path =
            format!("/clusters/{cluster_id}/nodes?pageNumber={page_number}&pageSize={page_size}");
        let page: Option<NodePage> = self.roa("GET", &path, None).await?;
        Ok(page.unwrap_or_default())
    }

    async fn get_cluster_certs(&self, cluster_id: &str) -> cirrus_cloud::Result<ClusterCerts> {
        Ok(self
            .roa("GET", &format!("/clusters/{cluster_id}/certs"), None)
            .await?)
    }

    async fn get_cluster_config(&self, cluster_id: &str) -> cirrus_cloud::Result<ClusterConfig> {
        Ok(self
            .roa("GET", &format!("/k8s/{cluster_id}/user_config"), None)
            .await?)
    }

    async fn delete_cluster(&self, cluster_id: &str) -> cirrus_cloud::Result<()> {
        let _: Value = self
            .roa("DELETE", &format!("/clusters/{cluster_id}"), None)
            .await?;
        Ok(())
    }
}
