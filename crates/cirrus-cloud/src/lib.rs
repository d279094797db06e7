//! Cirrus Cloud Infrastructure
//!
//! Vendor-neutral building blocks for Cirrus resource handlers: the
//! lifecycle contract the IaC host calls into, the attribute container it
//! passes, and the retry / poll primitives every handler wraps around its
//! remote calls.
//!
//! # Supported Providers
//!
//! - **Alibaba Cloud**: CEN route entries, managed Kubernetes clusters
//!   (`cirrus-cloud-alicloud`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  IaC host runtime                │
//! │        (diff, state storage, plan/apply)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │ create / read / update / delete
//! ┌─────────────────▼───────────────────────────────┐
//! │                 cirrus-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider / trait Resource<C>  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐ ┌──────────┐ ┌────────────┐   │
//! │  │ ResourceData │ │  retry   │ │   Waiter   │   │
//! │  └──────────────┘ └──────────┘ └────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼────────┐
//!           │    alicloud    │
//!           │    provider    │
//!           └────────────────┘
//! ```

pub mod error;
pub mod id;
pub mod invoker;
pub mod provider;
pub mod resource;
pub mod retry;
pub mod wait;

// Re-exports
pub use error::{CloudError, Result};
pub use id::{composite_id, parse_composite_id, prefixed_unique_id};
pub use invoker::{Catcher, Invoker};
pub use provider::{AuthStatus, CloudProvider, Operation, Resource, dispatch};
pub use resource::{Attributes, ResourceData, attributes};
pub use retry::{ErrorClass, RetryError, RetryPolicy, classify, retry, retry_classified};
pub use wait::{Progress, Waiter};
