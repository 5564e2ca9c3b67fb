//! Lifecycle decision engine for the cleanup resource.
//!
//! Create and Update only assign the physical id. Delete erases the bucket
//! prefix when the physical id still matches the declared properties and the
//! deletion gate allows it:
//!
//! 1. a stale or foreign physical id is a no-op;
//! 2. with `ActiveOnlyOnStackDeletion = "false"` the erase always runs;
//! 3. otherwise the erase runs only while the stack is `DELETE_IN_PROGRESS`.

use tracing::{info, warn};

use crate::contract::{
    has_valid_physical_resource_id, physical_resource_id, LifecycleEvent, ProcessEventError,
    ProcessedEvent, RequestType,
};
use crate::eraser::{BulkObjectEraser, ObjectVersionStore};
use crate::error::{CleanupError, StackStatusError};
use crate::properties::{DeletionGate, ResourceProperties};
use crate::stack_status::{is_stack_being_deleted, StackStatusQuery};

/// Fallback for request types the engine does not recognise.
pub trait UnknownRequestHandler {
    fn handle_unknown(&self, event: &LifecycleEvent) -> Result<ProcessedEvent, ProcessEventError>;
}

impl<F> UnknownRequestHandler for F
where
    F: Fn(&LifecycleEvent) -> Result<ProcessedEvent, ProcessEventError>,
{
    fn handle_unknown(&self, event: &LifecycleEvent) -> Result<ProcessedEvent, ProcessEventError> {
        self(event)
    }
}

pub struct CleanupEngine<'a, Q: ?Sized, S: ?Sized> {
    stack_status: &'a Q,
    eraser: BulkObjectEraser<'a, S>,
    unknown_request: &'a dyn UnknownRequestHandler,
}

impl<'a, Q, S> CleanupEngine<'a, Q, S>
where
    Q: StackStatusQuery + ?Sized,
    S: ObjectVersionStore + ?Sized,
{
    pub fn new(
        stack_status: &'a Q,
        store: &'a S,
        unknown_request: &'a dyn UnknownRequestHandler,
    ) -> Self {
        Self {
            stack_status,
            eraser: BulkObjectEraser::new(store),
            unknown_request,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.eraser = self.eraser.with_page_size(page_size);
        self
    }

    pub fn process_event(
        &self,
        event: &LifecycleEvent,
    ) -> Result<ProcessedEvent, ProcessEventError> {
        let properties = ResourceProperties::from_map(&event.resource_properties)
            .map_err(|error| ProcessEventError::new(String::new(), error))?;

        match &event.request_type {
            RequestType::Create | RequestType::Update => {
                let physical_id = physical_resource_id(&event.logical_resource_id, &properties);
                info!(
                    request_type = %event.request_type,
                    physical_resource_id = %physical_id,
                    "Assigned physical resource id"
                );
                Ok(ProcessedEvent::new(physical_id))
            }
            RequestType::Delete => self.process_delete(event, &properties),
            RequestType::Unknown(_) => self.unknown_request.handle_unknown(event),
        }
    }

    fn process_delete(
        &self,
        event: &LifecycleEvent,
        properties: &ResourceProperties,
    ) -> Result<ProcessedEvent, ProcessEventError> {
        let physical_id = event.current_physical_resource_id();

        if !has_valid_physical_resource_id(event, properties) {
            info!(
                physical_resource_id = %physical_id,
                logical_resource_id = %event.logical_resource_id,
                "Physical resource id does not match the properties, nothing to delete"
            );
            return Ok(ProcessedEvent::new(physical_id));
        }

        let should_delete = self
            .should_delete(&event.stack_id, properties)
            .map_err(|source| {
                ProcessEventError::new(
                    physical_id,
                    CleanupError::StatusQuery {
                        physical_resource_id: physical_id.to_string(),
                        source,
                    },
                )
            })?;

        if !should_delete {
            info!(
                physical_resource_id = %physical_id,
                stack_id = %event.stack_id,
                "Stack is not being deleted, keeping bucket contents"
            );
            return Ok(ProcessedEvent::new(physical_id));
        }

        info!(
            physical_resource_id = %physical_id,
            bucket = %properties.bucket,
            prefix = %properties.prefix,
            "Deleting all object versions"
        );
        match self.eraser.erase(&properties.bucket, &properties.prefix) {
            Ok(summary) => {
                info!(
                    physical_resource_id = %physical_id,
                    pages = summary.pages,
                    deleted = summary.deleted,
                    "Deleted object versions"
                );
                Ok(ProcessedEvent::new(physical_id))
            }
            Err(source) => {
                warn!(
                    physical_resource_id = %physical_id,
                    phase = %source.phase(),
                    error = %source,
                    "Object deletion failed"
                );
                Err(ProcessEventError::new(
                    physical_id,
                    CleanupError::Deletion {
                        physical_resource_id: physical_id.to_string(),
                        source,
                    },
                ))
            }
        }
    }

    /// Evaluate the deletion gate for a valid Delete event.
    pub fn should_delete(
        &self,
        stack_id: &str,
        properties: &ResourceProperties,
    ) -> Result<bool, StackStatusError> {
        match properties.gate {
            DeletionGate::Always => Ok(true),
            DeletionGate::OnStackDeletionOnly => {
                is_stack_being_deleted(self.stack_status, stack_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use crate::error::{DeletionPhase, EraseError, ProviderError};
    use crate::stack_status::StackStatus;
    use crate::test_helpers::{page, FixedStackStatus, ScriptedVersionStore};

    use super::*;

    fn reject_unknown(event: &LifecycleEvent) -> Result<ProcessedEvent, ProcessEventError> {
        Err(ProcessEventError::new(
            event.current_physical_resource_id(),
            CleanupError::UnknownRequestType {
                request_type: event.request_type.to_string(),
            },
        ))
    }

    fn properties(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("properties must be an object"),
        }
    }

    fn event(request_type: RequestType, physical_id: Option<&str>, gate: &str) -> LifecycleEvent {
        LifecycleEvent {
            request_type,
            logical_resource_id: "L1".to_string(),
            physical_resource_id: physical_id.map(str::to_string),
            stack_id: "S1".to_string(),
            resource_properties: properties(json!({
                "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:cleanup",
                "Bucket": "my-bucket",
                "Prefix": "logs/",
                "ActiveOnlyOnStackDeletion": gate
            })),
        }
    }

    #[test]
    fn create_and_update_only_assign_the_physical_id() {
        let stack = FixedStackStatus::with_status("S1", StackStatus::DeleteInProgress);
        let store = ScriptedVersionStore::new(vec![page(&["logs/a"], false)]);
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        for request_type in [RequestType::Create, RequestType::Update] {
            let processed = engine
                .process_event(&event(request_type, None, "false"))
                .expect("create/update should succeed");
            assert_eq!(processed.physical_resource_id, "L1:my-bucket:logs/");
            assert_eq!(processed.data, None);
        }

        assert!(stack.calls().is_empty());
        assert!(store.list_calls().is_empty());
        assert!(store.delete_calls().is_empty());
    }

    #[test]
    fn stale_delete_is_a_no_op() {
        let stack = FixedStackStatus::with_status("S1", StackStatus::DeleteInProgress);
        let store = ScriptedVersionStore::new(vec![page(&["logs/a"], false)]);
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        let processed = engine
            .process_event(&event(RequestType::Delete, Some("L1:my-bucket:old/"), "false"))
            .expect("stale delete should succeed");

        assert_eq!(processed.physical_resource_id, "L1:my-bucket:old/");
        assert!(stack.calls().is_empty());
        assert!(store.list_calls().is_empty());
    }

    #[test]
    fn disabled_gate_deletes_without_querying_the_stack() {
        let stack = FixedStackStatus::with_status("S1", StackStatus::UpdateComplete);
        let store = ScriptedVersionStore::new(vec![page(&["logs/a"], false)]);
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        engine
            .process_event(&event(RequestType::Delete, Some("L1:my-bucket:logs/"), "false"))
            .expect("delete should succeed");

        assert!(stack.calls().is_empty());
        assert_eq!(store.delete_calls().len(), 1);
    }

    #[test]
    fn default_gate_skips_when_stack_survives() {
        let stack =
            FixedStackStatus::with_status("S1", StackStatus::UpdateCompleteCleanupInProgress);
        let store = ScriptedVersionStore::new(vec![page(&["logs/a"], false)]);
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        let processed = engine
            .process_event(&event(RequestType::Delete, Some("L1:my-bucket:logs/"), "true"))
            .expect("delete should succeed");

        assert_eq!(processed.physical_resource_id, "L1:my-bucket:logs/");
        assert_eq!(stack.calls(), vec!["S1".to_string()]);
        assert!(store.list_calls().is_empty());
    }

    #[test]
    fn status_query_failure_is_wrapped_with_the_physical_id() {
        let stack = FixedStackStatus::failing(ProviderError::new("DescribeStacks", "throttled"));
        let store = ScriptedVersionStore::new(vec![page(&["logs/a"], false)]);
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        let failure = engine
            .process_event(&event(RequestType::Delete, Some("L1:my-bucket:logs/"), "true"))
            .expect_err("status failure should surface");

        assert_eq!(failure.physical_resource_id, "L1:my-bucket:logs/");
        assert!(matches!(
            failure.error,
            CleanupError::StatusQuery {
                source: StackStatusError::Describe { .. },
                ..
            }
        ));
        assert!(store.list_calls().is_empty());
    }

    #[test]
    fn deletion_failure_keeps_the_physical_id() {
        let stack = FixedStackStatus::with_status("S1", StackStatus::DeleteInProgress);
        let store = ScriptedVersionStore::new(vec![page(&["logs/a"], false)]).fail_delete_at(0);
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        let failure = engine
            .process_event(&event(RequestType::Delete, Some("L1:my-bucket:logs/"), "true"))
            .expect_err("deletion failure should surface");

        assert_eq!(failure.physical_resource_id, "L1:my-bucket:logs/");
        match failure.error {
            CleanupError::Deletion { source, .. } => {
                assert_eq!(source.phase(), DeletionPhase::DeleteBatch);
                assert!(matches!(source, EraseError::Provider { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_properties_fail_before_any_provider_call() {
        let stack = FixedStackStatus::with_status("S1", StackStatus::DeleteInProgress);
        let store = ScriptedVersionStore::new(Vec::new());
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        let mut delete = event(RequestType::Delete, Some("L1::logs/"), "false");
        delete.resource_properties.remove("Bucket");

        let failure = engine
            .process_event(&delete)
            .expect_err("missing bucket should fail");

        assert_eq!(failure.physical_resource_id, "");
        assert!(failure.error.is_validation());
        assert!(stack.calls().is_empty());
        assert!(store.list_calls().is_empty());
    }

    #[test]
    fn unknown_request_type_is_delegated() {
        let stack = FixedStackStatus::with_status("S1", StackStatus::DeleteInProgress);
        let store = ScriptedVersionStore::new(Vec::new());
        let engine = CleanupEngine::new(&stack, &store, &reject_unknown);

        let failure = engine
            .process_event(&event(
                RequestType::Unknown("Rollback".to_string()),
                Some("L1:my-bucket:logs/"),
                "false",
            ))
            .expect_err("unknown request should fail");

        assert_eq!(failure.error.to_string(), "unknown request type Rollback");
        assert!(store.list_calls().is_empty());
    }
}
