mod destroy;
mod outputs;
mod provision;
mod status;

pub use provision::Provisioned;
pub use status::{classify, Event};

use aws_config::SdkConfig;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};

/// A CloudFormation stack, existing or not
#[derive(Clone, Debug)]
pub struct Stack {
    pub name: String,
    client: aws_sdk_cloudformation::Client,
}

/// CloudFormation reports a missing stack as a validation error
fn is_missing<E: ProvideErrorMetadata, R>(error: &SdkError<E, R>) -> bool {
    matches!(error, SdkError::ServiceError(_))
        && error.code() == Some("ValidationError")
        && error.message().is_some_and(|m| m.contains("does not exist"))
}

impl Stack {
    pub fn new(config: &SdkConfig, name: &str) -> Self {
        Stack {
            name: name.into(),
            client: aws_sdk_cloudformation::Client::new(config),
        }
    }

    /// Current description of the stack, None if there is no such stack
    async fn describe(&self) -> eyre::Result<Option<aws_sdk_cloudformation::types::Stack>> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(&self.name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.stacks().first().cloned()),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(eyre::eyre!(
                "Failed to describe stack \"{}\": {:?}",
                self.name,
                e.message()
            )),
        }
    }

    /// Check if the stack already exists
    pub async fn is_exists(&self) -> eyre::Result<bool> {
        Ok(self.describe().await?.is_some())
    }
}
