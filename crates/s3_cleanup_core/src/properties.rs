use serde_json::{Map, Value};

use crate::error::CleanupError;

pub const BUCKET_PROPERTY: &str = "Bucket";
pub const PREFIX_PROPERTY: &str = "Prefix";
pub const ACTIVE_ONLY_ON_STACK_DELETION_PROPERTY: &str = "ActiveOnlyOnStackDeletion";

/// When a Delete event is allowed to erase the bucket contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionGate {
    /// Only while the owning stack is `DELETE_IN_PROGRESS`.
    #[default]
    OnStackDeletionOnly,
    /// On every valid Delete event.
    Always,
}

/// Declared properties of one cleanup resource, decoded once per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProperties {
    pub bucket: String,
    pub prefix: String,
    pub gate: DeletionGate,
}

impl ResourceProperties {
    /// Decode the recognised keys from a raw CloudFormation property map.
    ///
    /// Key names match case-insensitively. Keys other than the three recognised
    /// ones (for example `ServiceToken`) are ignored. A value of the wrong JSON
    /// type is rejected rather than defaulted.
    pub fn from_map(input: &Map<String, Value>) -> Result<Self, CleanupError> {
        let mut bucket = String::new();
        let mut prefix = String::new();
        let mut gate = DeletionGate::default();

        for (name, value) in input {
            if name.eq_ignore_ascii_case(BUCKET_PROPERTY) {
                bucket = as_string(name, value)?;
            } else if name.eq_ignore_ascii_case(PREFIX_PROPERTY) {
                prefix = as_string(name, value)?;
            } else if name.eq_ignore_ascii_case(ACTIVE_ONLY_ON_STACK_DELETION_PROPERTY) {
                gate = parse_gate(name, value)?;
            }
        }

        if bucket.is_empty() {
            return Err(CleanupError::validation("bucket name must be defined"));
        }

        Ok(Self {
            bucket,
            prefix,
            gate,
        })
    }
}

fn as_string(name: &str, value: &Value) -> Result<String, CleanupError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        _ => Err(CleanupError::validation(format!(
            "property '{name}' must be a string"
        ))),
    }
}

fn parse_gate(name: &str, value: &Value) -> Result<DeletionGate, CleanupError> {
    match value {
        Value::Null => Ok(DeletionGate::default()),
        Value::String(text) if text == "false" => Ok(DeletionGate::Always),
        Value::String(_) => Ok(DeletionGate::OnStackDeletionOnly),
        Value::Bool(false) => Ok(DeletionGate::Always),
        Value::Bool(true) => Ok(DeletionGate::OnStackDeletionOnly),
        _ => Err(CleanupError::validation(format!(
            "property '{name}' must be a string or a boolean"
        ))),
    }
}
