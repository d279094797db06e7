//! Resource handlers managed by the Alibaba Cloud provider

pub mod cen_route_entry;
pub mod managed_kubernetes;

pub use cen_route_entry::CenRouteEntry;
pub use managed_kubernetes::ManagedKubernetes;
