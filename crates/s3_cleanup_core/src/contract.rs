use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CleanupError;
use crate::properties::ResourceProperties;

pub const PHYSICAL_ID_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    Create,
    Update,
    Delete,
    Unknown(String),
}

impl RequestType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for RequestType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle callback for a cleanup resource.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    pub logical_resource_id: String,
    /// Absent on Create.
    pub physical_resource_id: Option<String>,
    pub stack_id: String,
    pub resource_properties: Map<String, Value>,
}

impl LifecycleEvent {
    pub fn current_physical_resource_id(&self) -> &str {
        self.physical_resource_id.as_deref().unwrap_or_default()
    }
}

/// `logical_resource_id:bucket:prefix`, the identity returned to CloudFormation.
pub fn physical_resource_id(logical_resource_id: &str, properties: &ResourceProperties) -> String {
    format!(
        "{logical_resource_id}{PHYSICAL_ID_SEPARATOR}{}{PHYSICAL_ID_SEPARATOR}{}",
        properties.bucket, properties.prefix
    )
}

/// A Delete is only honoured for the identity this event would produce today.
pub fn has_valid_physical_resource_id(
    event: &LifecycleEvent,
    properties: &ResourceProperties,
) -> bool {
    event.current_physical_resource_id()
        == physical_resource_id(&event.logical_resource_id, properties)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedEvent {
    pub physical_resource_id: String,
    pub data: Option<Map<String, Value>>,
}

impl ProcessedEvent {
    pub fn new(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: None,
        }
    }
}

/// A failed event; the physical id is kept so the failure stays attributable.
#[derive(Debug)]
pub struct ProcessEventError {
    /// Empty when the properties could not be decoded.
    pub physical_resource_id: String,
    pub error: CleanupError,
}

impl ProcessEventError {
    pub fn new(physical_resource_id: impl Into<String>, error: CleanupError) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            error,
        }
    }
}

impl fmt::Display for ProcessEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for ProcessEventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}
