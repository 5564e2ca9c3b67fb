//! AWS-oriented adapters and handlers for the S3 cleanup custom resource.
//!
//! This crate owns runtime integration details (the Lambda entry point,
//! CloudFormation event decoding, response upload and SDK adapters) and
//! exposes a single runtime module boundary for the lifecycle primitives.

pub mod adapters;
pub mod handlers;
pub mod runtime;
