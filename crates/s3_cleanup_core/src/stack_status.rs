//! Point-in-time stack status lookups.
//!
//! No retries and no caching: every call reflects the status CloudFormation
//! reports at that moment.

use std::fmt;

use tracing::debug;

use crate::error::{ProviderError, StackStatusError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    UpdateInProgress,
    UpdateCompleteCleanupInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackInProgress,
    UpdateRollbackFailed,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    ReviewInProgress,
    ImportInProgress,
    ImportComplete,
    ImportRollbackInProgress,
    ImportRollbackFailed,
    ImportRollbackComplete,
    Unknown(String),
}

impl StackStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_FAILED" => Self::CreateFailed,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => Self::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => Self::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => Self::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                Self::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => Self::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => Self::ReviewInProgress,
            "IMPORT_IN_PROGRESS" => Self::ImportInProgress,
            "IMPORT_COMPLETE" => Self::ImportComplete,
            "IMPORT_ROLLBACK_IN_PROGRESS" => Self::ImportRollbackInProgress,
            "IMPORT_ROLLBACK_FAILED" => Self::ImportRollbackFailed,
            "IMPORT_ROLLBACK_COMPLETE" => Self::ImportRollbackComplete,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            Self::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            Self::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            Self::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::ImportInProgress => "IMPORT_IN_PROGRESS",
            Self::ImportComplete => "IMPORT_COMPLETE",
            Self::ImportRollbackInProgress => "IMPORT_ROLLBACK_IN_PROGRESS",
            Self::ImportRollbackFailed => "IMPORT_ROLLBACK_FAILED",
            Self::ImportRollbackComplete => "IMPORT_ROLLBACK_COMPLETE",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    pub stack_id: String,
    pub stack_name: String,
    pub status: StackStatus,
}

pub trait StackStatusQuery {
    /// Describe the stack named or identified by `stack_id`.
    fn describe_stack(&self, stack_id: &str) -> Result<Vec<StackDescription>, ProviderError>;
}

/// Whether the stack is currently `DELETE_IN_PROGRESS`.
pub fn is_stack_being_deleted<Q>(query: &Q, stack_id: &str) -> Result<bool, StackStatusError>
where
    Q: StackStatusQuery + ?Sized,
{
    let stacks = query
        .describe_stack(stack_id)
        .map_err(|source| StackStatusError::Describe {
            stack_id: stack_id.to_string(),
            source,
        })?;

    let Some(stack) = stacks.first() else {
        return Err(StackStatusError::NotFound {
            stack_id: stack_id.to_string(),
        });
    };

    debug!(stack_id = %stack_id, status = %stack.status, "Fetched stack status");
    Ok(stack.status == StackStatus::DeleteInProgress)
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::FixedStackStatus;

    use super::*;

    #[test]
    fn delete_in_progress_means_being_deleted() {
        let query = FixedStackStatus::with_status("S1", StackStatus::DeleteInProgress);
        assert!(is_stack_being_deleted(&query, "S1").expect("query should succeed"));
        assert_eq!(query.calls(), vec!["S1".to_string()]);
    }

    #[test]
    fn other_statuses_are_not_deletion() {
        for status in [
            StackStatus::UpdateInProgress,
            StackStatus::UpdateCompleteCleanupInProgress,
            StackStatus::DeleteComplete,
            StackStatus::DeleteFailed,
            StackStatus::Unknown("SOMETHING_NEW".to_string()),
        ] {
            let query = FixedStackStatus::with_status("S1", status);
            assert!(!is_stack_being_deleted(&query, "S1").expect("query should succeed"));
        }
    }

    #[test]
    fn empty_result_is_an_error() {
        let query = FixedStackStatus::empty();
        let error = is_stack_being_deleted(&query, "S1").expect_err("no stack should fail");
        assert!(matches!(error, StackStatusError::NotFound { .. }));
    }

    #[test]
    fn provider_error_propagates() {
        let query = FixedStackStatus::failing(
            ProviderError::new("DescribeStacks", "Stack with id S1 does not exist")
                .with_code("ValidationError"),
        );
        let error = is_stack_being_deleted(&query, "S1").expect_err("provider error");
        match error {
            StackStatusError::Describe { stack_id, source } => {
                assert_eq!(stack_id, "S1");
                assert_eq!(source.code.as_deref(), Some("ValidationError"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wire_names_round_trip() {
        for raw in [
            "DELETE_IN_PROGRESS",
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
            "IMPORT_COMPLETE",
            "NOT_A_STATUS",
        ] {
            assert_eq!(StackStatus::from_wire(raw).as_str(), raw);
        }
    }
}
