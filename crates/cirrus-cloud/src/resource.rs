//! Host-provided resource data container
//!
//! The IaC host hands each lifecycle call a flat attribute set: the prior
//! state it stored last time and the configuration it wants applied now.
//! Handlers read from it, write computed attributes back, and set or clear
//! the resource id.

use crate::error::{CloudError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub type Attributes = Map<String, Value>;

/// Attribute container for a single resource instance
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: String,

    /// State recorded by the host before this call
    prior: Attributes,

    /// Desired configuration merged with computed attributes
    current: Attributes,

    /// Keys committed while in partial mode (`None` when not partial)
    partial: Option<BTreeSet<String>>,
}

impl ResourceData {
    /// Data for a resource that does not exist yet.
    pub fn new(config: Attributes) -> Self {
        Self {
            current: config,
            ..Default::default()
        }
    }

    /// Data for an existing resource whose config matches its state.
    pub fn from_state(id: impl Into<String>, state: Attributes) -> Self {
        Self {
            id: id.into(),
            prior: state.clone(),
            current: state,
            partial: None,
        }
    }

    /// Data for an update: `prior` is the stored state, `config` the new one.
    pub fn with_changes(id: impl Into<String>, prior: Attributes, config: Attributes) -> Self {
        Self {
            id: id.into(),
            prior,
            current: config,
            partial: None,
        }
    }

    /// Import passthrough: only the identifier is known.
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone; the host drops it from state.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    /// Raw attribute value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.current.get(key).filter(|v| !v.is_null())
    }

    /// Typed attribute value; `None` when absent or of the wrong type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.value(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Attribute value only when it is set to a non-zero value
    /// (non-empty string, non-zero number, `true`, non-empty list).
    pub fn get_ok<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.value(key)
            .filter(|v| !is_zero(v))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Non-empty string attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.value(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `(old, new)` values of an attribute.
    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (
            self.prior.get(key).filter(|v| !v.is_null()),
            self.value(key),
        )
    }

    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        old != new
    }

    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        self.current.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Deserialize the whole attribute set into a typed configuration.
    ///
    /// Null attributes count as unset, so serde defaults apply to them.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let set: Attributes = self
            .current
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(set))
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))
    }

    /// Enter partial mode: on failure only keys passed to
    /// [`set_partial`](Self::set_partial) are committed.
    pub fn begin_partial(&mut self) {
        self.partial = Some(BTreeSet::new());
    }

    pub fn set_partial(&mut self, key: impl Into<String>) {
        if let Some(keys) = self.partial.as_mut() {
            keys.insert(key.into());
        }
    }

    pub fn end_partial(&mut self) {
        self.partial = None;
    }

    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }

    /// The attribute set the host should persist after this call.
    pub fn state(&self) -> Attributes {
        match &self.partial {
            None => self.current.clone(),
            Some(keys) => {
                let mut state = self.prior.clone();
                for key in keys {
                    match self.current.get(key) {
                        Some(v) => state.insert(key.clone(), v.clone()),
                        None => state.remove(key),
                    };
                }
                state
            }
        }
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Build an attribute map from a JSON object literal.
///
/// Non-object values produce an empty map.
pub fn attributes(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}
