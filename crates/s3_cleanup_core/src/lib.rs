//! Lifecycle logic for the S3 cleanup custom resource.
//!
//! This crate owns the delete decision, the physical resource identity and the
//! paginated all-versions eraser. It intentionally excludes AWS SDK and Lambda
//! runtime concerns: collaborators are reached through the `StackStatusQuery`
//! and `ObjectVersionStore` traits.

pub mod contract;
pub mod engine;
pub mod eraser;
pub mod error;
pub mod pagination;
pub mod properties;
pub mod stack_status;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
