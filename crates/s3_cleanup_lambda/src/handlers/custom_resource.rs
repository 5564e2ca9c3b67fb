use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::adapters::response::ResponseSender;
use crate::runtime::contract::{LifecycleEvent, ProcessEventError, ProcessedEvent, RequestType};
use crate::runtime::engine::CleanupEngine;
use crate::runtime::eraser::ObjectVersionStore;
use crate::runtime::error::{error_chain, CleanupError};
use crate::runtime::pagination::MAX_KEYS_PER_REQUEST;
use crate::runtime::stack_status::StackStatusQuery;

pub const PAGE_SIZE_ENV: &str = "CLEANUP_LIST_PAGE_SIZE";

/// The request document CloudFormation sends to a custom resource provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub resource_type: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
    #[serde(default)]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl CustomResourceRequest {
    pub fn lifecycle_event(&self) -> LifecycleEvent {
        LifecycleEvent {
            request_type: self.request_type.clone(),
            logical_resource_id: self.logical_resource_id.clone(),
            physical_resource_id: self.physical_resource_id.clone(),
            stack_id: self.stack_id.clone(),
            resource_properties: self.resource_properties.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// CloudWatch log stream of the current invocation.
    pub log_stream_name: String,
    pub page_size: Option<usize>,
}

#[derive(Debug, Error)]
pub enum CustomResourceHandlerError {
    #[error("invalid custom resource event: {0}")]
    MalformedEvent(#[source] serde_json::Error),
    #[error("failed to serialize custom resource response: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("failed to deliver custom resource response: {0}")]
    ResponseDelivery(String),
}

/// Read the optional listing page size. Unset means the provider default.
pub fn parse_page_size(raw: Option<&str>) -> Result<Option<usize>, String> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<usize>() {
        Ok(value) if (1..=MAX_KEYS_PER_REQUEST).contains(&value) => Ok(Some(value)),
        _ => Err(format!(
            "{PAGE_SIZE_ENV} must be an integer between 1 and {MAX_KEYS_PER_REQUEST}, got '{raw}'"
        )),
    }
}

pub fn reject_unknown_request_type(
    event: &LifecycleEvent,
) -> Result<ProcessedEvent, ProcessEventError> {
    Err(ProcessEventError::new(
        event.current_physical_resource_id(),
        CleanupError::UnknownRequestType {
            request_type: event.request_type.to_string(),
        },
    ))
}

/// Turn the engine outcome into the document CloudFormation expects.
///
/// CloudFormation rejects an empty physical id, so a failure without one
/// falls back to the id CloudFormation already knows or the log stream name.
pub fn build_response(
    request: &CustomResourceRequest,
    outcome: Result<ProcessedEvent, ProcessEventError>,
    log_stream_name: &str,
) -> CustomResourceResponse {
    let (status, reason, physical_id, data) = match outcome {
        Ok(processed) => (
            ResponseStatus::Success,
            None,
            processed.physical_resource_id,
            processed.data,
        ),
        Err(failure) => (
            ResponseStatus::Failed,
            Some(format!(
                "{}. See the details in CloudWatch Log Stream: {log_stream_name}",
                error_chain(&failure.error)
            )),
            failure.physical_resource_id,
            None,
        ),
    };

    let physical_resource_id = if physical_id.is_empty() {
        request
            .physical_resource_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| log_stream_name.to_string())
    } else {
        physical_id
    };

    CustomResourceResponse {
        status,
        reason,
        physical_resource_id,
        stack_id: request.stack_id.clone(),
        request_id: request.request_id.clone(),
        logical_resource_id: request.logical_resource_id.clone(),
        no_echo: false,
        data,
    }
}

/// Process one CloudFormation invocation and report the result to its
/// `ResponseURL`.
///
/// A cleanup failure is reported to CloudFormation as `FAILED`; only an
/// undecodable event or an undeliverable response fails the invocation.
pub fn handle_custom_resource_event(
    payload: Value,
    config: &HandlerConfig,
    stack_status: &dyn StackStatusQuery,
    store: &dyn ObjectVersionStore,
    sender: &dyn ResponseSender,
) -> Result<CustomResourceResponse, CustomResourceHandlerError> {
    let request: CustomResourceRequest =
        serde_json::from_value(payload).map_err(CustomResourceHandlerError::MalformedEvent)?;

    info!(
        request_type = %request.request_type,
        request_id = %request.request_id,
        logical_resource_id = %request.logical_resource_id,
        stack_id = %request.stack_id,
        "Received custom resource event"
    );

    let mut engine = CleanupEngine::new(stack_status, store, &reject_unknown_request_type);
    if let Some(page_size) = config.page_size {
        engine = engine.with_page_size(page_size);
    }

    let outcome = engine.process_event(&request.lifecycle_event());
    if let Err(failure) = &outcome {
        tracing::error!(
            request_id = %request.request_id,
            physical_resource_id = %failure.physical_resource_id,
            error = %error_chain(&failure.error),
            "Custom resource event failed"
        );
    }

    let response = build_response(&request, outcome, &config.log_stream_name);
    let body = serde_json::to_vec(&response).map_err(CustomResourceHandlerError::Serialization)?;
    sender
        .send_response(&request.response_url, &body)
        .map_err(CustomResourceHandlerError::ResponseDelivery)?;

    info!(
        request_id = %request.request_id,
        status = ?response.status,
        physical_resource_id = %response.physical_resource_id,
        "Sent custom resource response"
    );
    Ok(response)
}
