use lambda_runtime::{service_fn, Error, LambdaEvent};
use s3_cleanup_lambda::adapters::cloudformation::CloudFormationStackStatus;
use s3_cleanup_lambda::adapters::object_store::S3VersionStore;
use s3_cleanup_lambda::adapters::response::HttpResponseSender;
use s3_cleanup_lambda::handlers::custom_resource::{
    handle_custom_resource_event, parse_page_size, CustomResourceResponse, HandlerConfig,
    PAGE_SIZE_ENV,
};
use tracing_subscriber::EnvFilter;

struct Collaborators {
    stack_status: CloudFormationStackStatus,
    store: S3VersionStore,
    sender: HttpResponseSender,
    page_size: Option<usize>,
}

async fn handle_request(
    event: LambdaEvent<serde_json::Value>,
    collaborators: &Collaborators,
) -> Result<CustomResourceResponse, Error> {
    let config = HandlerConfig {
        log_stream_name: event.context.env_config.log_stream.clone(),
        page_size: collaborators.page_size,
    };

    handle_custom_resource_event(
        event.payload,
        &config,
        &collaborators.stack_status,
        &collaborators.store,
        &collaborators.sender,
    )
    .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let page_size = parse_page_size(std::env::var(PAGE_SIZE_ENV).ok().as_deref())?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let collaborators = Collaborators {
        stack_status: CloudFormationStackStatus::new(aws_sdk_cloudformation::Client::new(
            &aws_config,
        )),
        store: S3VersionStore::new(aws_sdk_s3::Client::new(&aws_config)),
        sender: HttpResponseSender::new(reqwest::Client::new()),
        page_size,
    };
    let collaborators = &collaborators;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, collaborators).await
    }))
    .await
}
