//! Typed configuration of a managed cluster and the request bodies built
//! from it.

use crate::client::AlicloudClient;
use crate::cs::{KubernetesCreationArgs, KubernetesScaleArgs, PrepaidPeriod};
use cirrus_cloud::{CloudError, ResourceData, Result, prefixed_unique_id};
use serde::Deserialize;
use serde_json::Value;

pub const CLUSTER_TYPE: &str = "ManagedKubernetes";
pub const CREATION_TIMEOUT_MINS: u32 = 60;

pub const DEFAULT_NAME_PREFIX: &str = "Terraform-Creation";
pub const DEFAULT_WORKER_NUMBER: u32 = 3;

pub const DISK_CLOUD_EFFICIENCY: &str = "cloud_efficiency";
pub const DISK_CLOUD_SSD: &str = "cloud_ssd";
pub const POST_PAID: &str = "PostPaid";
pub const PRE_PAID: &str = "PrePaid";
pub const NETWORK_FLANNEL: &str = "flannel";
pub const NETWORK_TERWAY: &str = "terway";

const DISK_SIZE_RANGE: std::ops::RangeInclusive<u32> = 20..=32768;
const MAX_LIST_ITEMS: usize = 5;
const AUTO_RENEW_PERIODS: &[u32] = &[1, 2, 3, 6, 12];
const MONTH_PERIODS: &[u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 12, 24, 36, 48, 60];
const WEEK_PERIODS: &[u32] = &[1, 2, 3, 4];
/// Room left for the timestamp and counter of a generated name
const MAX_NAME_PREFIX_LEN: usize = 37;
const MAX_NAME_LEN: usize = 63;

/// Configuration of `alicloud_cs_managed_kubernetes`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManagedKubernetesConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    #[serde(default)]
    pub availability_zone: String,

    #[serde(default)]
    pub vswitch_ids: Vec<String>,

    #[serde(default = "default_true")]
    pub new_nat_gateway: bool,

    #[serde(default)]
    pub worker_instance_types: Vec<String>,

    #[serde(default = "default_worker_number")]
    pub worker_number: u32,

    /// Deprecated single-element list replaced by `worker_number`
    #[serde(default)]
    pub worker_numbers: Vec<u32>,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub key_name: String,

    #[serde(default)]
    pub pod_cidr: String,

    #[serde(default)]
    pub service_cidr: String,

    #[serde(default)]
    pub cluster_network_type: String,

    #[serde(default)]
    pub image_id: String,

    #[serde(default = "default_disk_size")]
    pub worker_disk_size: u32,

    #[serde(default = "default_disk_category")]
    pub worker_disk_category: String,

    #[serde(default = "default_disk_size")]
    pub worker_data_disk_size: u32,

    #[serde(default)]
    pub worker_data_disk_category: String,

    #[serde(default = "default_charge_type")]
    pub worker_instance_charge_type: String,

    #[serde(default = "default_period_unit")]
    pub worker_period_unit: String,

    #[serde(default = "default_one")]
    pub worker_period: u32,

    #[serde(default)]
    pub worker_auto_renew: bool,

    #[serde(default = "default_one")]
    pub worker_auto_renew_period: u32,

    #[serde(default)]
    pub slb_internet_enabled: bool,

    #[serde(default)]
    pub install_cloud_monitor: bool,

    #[serde(default)]
    pub force_update: bool,

    #[serde(default)]
    pub kube_config: String,

    #[serde(default)]
    pub client_cert: String,

    #[serde(default)]
    pub client_key: String,

    #[serde(default)]
    pub cluster_ca_cert: String,

    #[serde(default)]
    pub version: String,
}

fn default_name_prefix() -> String {
    DEFAULT_NAME_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_worker_number() -> u32 {
    DEFAULT_WORKER_NUMBER
}

fn default_disk_size() -> u32 {
    40
}

fn default_disk_category() -> String {
    DISK_CLOUD_EFFICIENCY.to_string()
}

fn default_charge_type() -> String {
    POST_PAID.to_string()
}

fn default_period_unit() -> String {
    "Month".to_string()
}

fn default_one() -> u32 {
    1
}

impl ManagedKubernetesConfig {
    /// Check value ranges and conflicting attributes before any remote call.
    pub fn validate(&self) -> Result<()> {
        if !self.name.is_empty() {
            validate_cluster_name(&self.name, MAX_NAME_LEN, "name")?;
        }
        validate_cluster_name(&self.name_prefix, MAX_NAME_PREFIX_LEN, "name_prefix")?;

        if self.vswitch_ids.is_empty() || self.vswitch_ids.len() > MAX_LIST_ITEMS {
            return Err(invalid(format!(
                "vswitch_ids must contain 1 to {MAX_LIST_ITEMS} items, got {}",
                self.vswitch_ids.len()
            )));
        }
        if let Some(id) = self.vswitch_ids.iter().find(|id| !id.starts_with("vsw-")) {
            return Err(invalid(format!("{id:?} is not a vswitch id")));
        }

        if self.worker_instance_types.is_empty()
            || self.worker_instance_types.len() > MAX_LIST_ITEMS
        {
            return Err(invalid(format!(
                "worker_instance_types must contain 1 to {MAX_LIST_ITEMS} items, got {}",
                self.worker_instance_types.len()
            )));
        }

        if self.worker_numbers.len() > 1 {
            return Err(invalid("worker_numbers accepts a single item".to_string()));
        }

        if !self.password.is_empty() && !self.key_name.is_empty() {
            return Err(invalid(
                "password and key_name cannot be set at the same time".to_string(),
            ));
        }

        if !self.cluster_network_type.is_empty()
            && ![NETWORK_FLANNEL, NETWORK_TERWAY].contains(&self.cluster_network_type.as_str())
        {
            return Err(invalid(format!(
                "cluster_network_type must be {NETWORK_FLANNEL} or {NETWORK_TERWAY}, got {:?}",
                self.cluster_network_type
            )));
        }

        check_disk_category("worker_disk_category", &self.worker_disk_category)?;
        check_disk_size("worker_disk_size", self.worker_disk_size)?;
        if self.has_data_disk() {
            check_disk_category("worker_data_disk_category", &self.worker_data_disk_category)?;
            check_disk_size("worker_data_disk_size", self.worker_data_disk_size)?;
        }

        match self.worker_instance_charge_type.as_str() {
            POST_PAID => {}
            PRE_PAID => self.validate_period()?,
            other => {
                return Err(invalid(format!(
                    "worker_instance_charge_type must be {POST_PAID} or {PRE_PAID}, got {other:?}"
                )));
            }
        }

        Ok(())
    }

    fn validate_period(&self) -> Result<()> {
        let allowed = match self.worker_period_unit.as_str() {
            "Month" => MONTH_PERIODS,
            "Week" => WEEK_PERIODS,
            other => {
                return Err(invalid(format!(
                    "worker_period_unit must be Week or Month, got {other:?}"
                )));
            }
        };
        if !allowed.contains(&self.worker_period) {
            return Err(invalid(format!(
                "worker_period {} is not valid for unit {}",
                self.worker_period, self.worker_period_unit
            )));
        }
        if !AUTO_RENEW_PERIODS.contains(&self.worker_auto_renew_period) {
            return Err(invalid(format!(
                "worker_auto_renew_period must be one of {AUTO_RENEW_PERIODS:?}"
            )));
        }
        Ok(())
    }

    pub fn has_data_disk(&self) -> bool {
        !self.worker_data_disk_category.is_empty()
    }

    /// Configured name, or a fresh unique one built from `name_prefix`.
    pub fn cluster_name(&self) -> String {
        if self.name.is_empty() {
            prefixed_unique_id(&self.name_prefix)
        } else {
            self.name.clone()
        }
    }

    /// Whether any certificate destination is configured
    pub fn wants_certs(&self) -> bool {
        [&self.client_cert, &self.client_key, &self.cluster_ca_cert]
            .iter()
            .any(|path| !path.is_empty())
    }
}

fn validate_cluster_name(name: &str, max_len: usize, field: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if name.is_empty() || name.len() > max_len || name.starts_with('-') || !valid_chars {
        return Err(invalid(format!(
            "{field} must be 1 to {max_len} letters, digits, '-' or '_' and not start with '-', got {name:?}"
        )));
    }
    Ok(())
}

fn check_disk_category(field: &str, category: &str) -> Result<()> {
    if category == DISK_CLOUD_EFFICIENCY || category == DISK_CLOUD_SSD {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} must be {DISK_CLOUD_EFFICIENCY} or {DISK_CLOUD_SSD}, got {category:?}"
        )))
    }
}

fn check_disk_size(field: &str, size: u32) -> Result<()> {
    if DISK_SIZE_RANGE.contains(&size) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} must be between {} and {} GiB, got {size}",
            DISK_SIZE_RANGE.start(),
            DISK_SIZE_RANGE.end()
        )))
    }
}

fn invalid(message: String) -> CloudError {
    CloudError::InvalidConfig(message)
}

/// Drop repeated instance types, keeping the first occurrence of each.
pub fn deduplicate_instance_types(instance_types: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    instance_types
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// Build the creation request, resolving every vswitch to check that they
/// share one VPC.
pub async fn build_creation_args(
    config: &ManagedKubernetesConfig,
    client: &AlicloudClient,
) -> Result<KubernetesCreationArgs> {
    let mut vpc_id = String::new();
    let mut zone_id = String::new();

    for vswitch_id in &config.vswitch_ids {
        let vswitch = client.vpc().describe_vswitch(vswitch_id).await?;
        if vpc_id.is_empty() {
            vpc_id = vswitch.vpc_id;
            zone_id = vswitch.zone_id;
        } else if vswitch.vpc_id != vpc_id {
            return Err(invalid(format!(
                "all specified vswitches should be in the same vpc {vpc_id}: {:?}",
                config.vswitch_ids
            )));
        }
    }

    let mut args = KubernetesCreationArgs {
        name: config.cluster_name(),
        cluster_type: CLUSTER_TYPE.to_string(),
        disable_rollback: true,
        timeout_mins: CREATION_TIMEOUT_MINS,
        region_id: client.region_id().to_string(),
        vpc_id,
        zone_id,
        vswitch_ids: config.vswitch_ids.clone(),
        worker_instance_types: deduplicate_instance_types(&config.worker_instance_types),
        num_of_nodes: config.worker_number,
        login_password: config.password.clone(),
        key_pair: config.key_name.clone(),
        image_id: config.image_id.clone(),
        network: config.cluster_network_type.clone(),
        pod_cidr: config.pod_cidr.clone(),
        service_cidr: config.service_cidr.clone(),
        worker_system_disk_category: config.worker_disk_category.clone(),
        worker_system_disk_size: config.worker_disk_size,
        worker_instance_charge_type: config.worker_instance_charge_type.clone(),
        snat_entry: config.new_nat_gateway,
        kubernetes_version: config.version.clone(),
        cloud_monitor_flags: config.install_cloud_monitor,
        public_slb: config.slb_internet_enabled,
        ..Default::default()
    };

    if config.has_data_disk() {
        args.worker_data_disk = true;
        args.worker_data_disk_category = config.worker_data_disk_category.clone();
        args.worker_data_disk_size = Some(config.worker_data_disk_size);
    }

    if config.worker_instance_charge_type == PRE_PAID {
        args.worker_period = Some(PrepaidPeriod {
            period: config.worker_period,
            period_unit: config.worker_period_unit.clone(),
            auto_renew: config.worker_auto_renew,
            auto_renew_period: config.worker_auto_renew_period,
        });
    }

    Ok(args)
}

/// Request body adding `count` worker nodes.
///
/// A cluster created with a key pair ignores the password; one created with
/// a password needs it again to resize.
pub fn build_scale_args(config: &ManagedKubernetesConfig, count: u32) -> KubernetesScaleArgs {
    KubernetesScaleArgs {
        login_password: config.password.clone(),
        key_pair: config.key_name.clone(),
        worker_instance_types: deduplicate_instance_types(&config.worker_instance_types),
        worker_system_disk_category: config.worker_disk_category.clone(),
        worker_system_disk_size: config.worker_disk_size,
        worker_data_disk: config.has_data_disk(),
        count,
    }
}

/// Number of worker nodes to add, or `None` when the count did not change.
///
/// The deprecated `worker_numbers` list is only consulted when
/// `worker_number` itself is unchanged and the new list is non-empty.
pub fn scale_delta(data: &ResourceData) -> Result<Option<u32>> {
    let delta = if data.has_change("worker_number") {
        let (old, new) = data.get_change("worker_number");
        worker_count(new) - worker_count(old)
    } else if data.has_change("worker_numbers") {
        let (old, new) = data.get_change("worker_numbers");
        let Some(new_sum) = list_sum(new) else {
            return Ok(None);
        };
        new_sum - list_sum(old).unwrap_or_default()
    } else {
        return Ok(None);
    };

    match delta {
        d if d < 0 => Err(invalid(format!(
            "cannot scale down cluster (worker count change {d})"
        ))),
        0 => Ok(None),
        d => Ok(Some(d as u32)),
    }
}

fn worker_count(value: Option<&Value>) -> i64 {
    value
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_WORKER_NUMBER as i64)
}

/// Sum of a non-empty integer list
fn list_sum(value: Option<&Value>) -> Option<i64> {
    let items = value?.as_array()?;
    if items.is_empty() {
        return None;
    }
    Some(items.iter().filter_map(Value::as_i64).sum())
}
