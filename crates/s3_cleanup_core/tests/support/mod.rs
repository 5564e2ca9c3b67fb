#![allow(dead_code)]

use s3_cleanup_core::contract::{LifecycleEvent, ProcessEventError, ProcessedEvent, RequestType};
use s3_cleanup_core::error::CleanupError;
use serde_json::{json, Map, Value};

pub const LOGICAL_ID: &str = "L1";
pub const STACK_ID: &str = "S1";

pub fn reject_unknown(event: &LifecycleEvent) -> Result<ProcessedEvent, ProcessEventError> {
    Err(ProcessEventError::new(
        event.current_physical_resource_id(),
        CleanupError::UnknownRequestType {
            request_type: event.request_type.to_string(),
        },
    ))
}

/// Builder for cleanup events against a fixed logical id and stack.
#[derive(Clone, Debug)]
pub struct EventBuilder {
    request_type: RequestType,
    physical_resource_id: Option<String>,
    properties: Map<String, Value>,
}

impl EventBuilder {
    pub fn new(request_type: RequestType) -> Self {
        let Value::Object(properties) = json!({
            "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:s3-cleanup",
        }) else {
            unreachable!("literal is an object");
        };
        Self {
            request_type,
            physical_resource_id: None,
            properties,
        }
    }

    pub fn delete(physical_resource_id: &str) -> Self {
        Self::new(RequestType::Delete).physical_id(physical_resource_id)
    }

    pub fn physical_id(mut self, physical_resource_id: &str) -> Self {
        self.physical_resource_id = Some(physical_resource_id.to_string());
        self
    }

    pub fn property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> LifecycleEvent {
        LifecycleEvent {
            request_type: self.request_type,
            logical_resource_id: LOGICAL_ID.to_string(),
            physical_resource_id: self.physical_resource_id,
            stack_id: STACK_ID.to_string(),
            resource_properties: self.properties,
        }
    }
}
