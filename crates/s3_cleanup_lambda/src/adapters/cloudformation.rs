use aws_sdk_cloudformation::types::Stack;
use s3_cleanup_core::error::ProviderError;
use s3_cleanup_core::stack_status::{StackDescription, StackStatus, StackStatusQuery};

use crate::adapters::sdk_error::provider_error;

/// [`StackStatusQuery`] backed by `DescribeStacks`.
pub struct CloudFormationStackStatus {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStackStatus {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

impl StackStatusQuery for CloudFormationStackStatus {
    fn describe_stack(&self, stack_id: &str) -> Result<Vec<StackDescription>, ProviderError> {
        let stack_name = stack_id.to_string();
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .describe_stacks()
                    .stack_name(stack_name)
                    .send()
                    .await
                    .map(|output| output.stacks().iter().map(stack_description).collect())
                    .map_err(|error| provider_error("DescribeStacks", &error))
            })
        })
    }
}

pub fn stack_description(stack: &Stack) -> StackDescription {
    StackDescription {
        stack_id: stack.stack_id().unwrap_or_default().to_string(),
        stack_name: stack.stack_name().unwrap_or_default().to_string(),
        status: stack
            .stack_status()
            .map(|status| StackStatus::from_wire(status.as_str()))
            .unwrap_or_else(|| StackStatus::Unknown(String::new())),
    }
}
