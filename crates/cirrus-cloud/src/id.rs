//! Composite identifiers and generated names

use crate::error::{CloudError, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};

pub const COLON_SEPARATED: &str = ":";

/// Join key fields into an externally visible identifier (`a:b:c`).
pub fn composite_id(parts: &[&str]) -> String {
    parts.join(COLON_SEPARATED)
}

/// Split an identifier built by [`composite_id`] into exactly `count` parts.
///
/// The last part keeps any further separators, so IPv6 CIDR blocks survive.
pub fn parse_composite_id(id: &str, count: usize) -> Result<Vec<&str>> {
    let parts: Vec<&str> = id.splitn(count, COLON_SEPARATED).collect();
    if parts.len() != count || parts.iter().any(|p| p.is_empty()) {
        return Err(CloudError::InvalidId {
            id: id.to_string(),
            expected: count,
        });
    }
    Ok(parts)
}

static UNIQUE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// `prefix` followed by a UTC timestamp and a process-wide counter.
///
/// Names sort by creation time and never repeat within a process.
pub fn prefixed_unique_id(prefix: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f");
    let counter = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{prefix}{timestamp}{counter:08x}")
}
