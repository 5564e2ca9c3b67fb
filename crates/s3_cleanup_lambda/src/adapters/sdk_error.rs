use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use s3_cleanup_core::error::ProviderError;

/// Convert an SDK error into the core's provider error, keeping the AWS
/// error code when the service returned one.
pub fn provider_error<E>(operation: &'static str, error: &E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = error
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(error).to_string());

    match error.code() {
        Some(code) => ProviderError::new(operation, message).with_code(code),
        None => ProviderError::new(operation, message),
    }
}
