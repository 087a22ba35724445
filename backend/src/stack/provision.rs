use super::Stack;
use crate::template::Template;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, Parameter, StackStatus as CfnStatus, Tag};
use eyre::{eyre, WrapErr};

/// Outcome of a create or update request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    Updated,

    /// The template and the parameters did not change, nothing to do
    UpToDate,
}

/// CloudFormation rejects an update without changes instead of ignoring it
fn is_no_updates(message: Option<&str>) -> bool {
    message.is_some_and(|m| m.contains("No updates are to be performed"))
}

impl Stack {
    /// Create the stack or update the existing one
    ///
    /// Parameters carry the object keys produced by the uploads.
    pub async fn provision(
        &self,
        template: &Template,
        parameters: &[(String, String)],
    ) -> eyre::Result<Provisioned> {
        let capabilities = Capability::CapabilityIam;
        let body = template.body()?;

        let parameters = parameters
            .iter()
            .map(|(key, value)| {
                Parameter::builder()
                    .parameter_key(key)
                    .parameter_value(value)
                    .build()
            })
            .collect::<Vec<Parameter>>();

        let tags = template
            .tags()
            .into_iter()
            .flatten()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect::<Vec<Tag>>();

        let Some(stack) = self.describe().await? else {
            log::info!("Creating stack {}", self.name);

            self.client
                .create_stack()
                .capabilities(capabilities)
                .stack_name(&self.name)
                .template_body(body)
                .set_parameters(Some(parameters))
                .set_tags(Some(tags))
                .send()
                .await
                .wrap_err("Failed to create stack")?;

            return Ok(Provisioned::Created);
        };

        // A stack whose creation was rolled back can only be deleted
        if stack.stack_status() == Some(&CfnStatus::RollbackComplete) {
            return Err(eyre!(
                "Stack \"{}\" failed to create and was rolled back, destroy it first",
                self.name
            ));
        }

        log::info!("Updating stack {}", self.name);

        let result = self
            .client
            .update_stack()
            .capabilities(capabilities)
            .stack_name(&self.name)
            .template_body(body)
            .set_parameters(Some(parameters))
            .set_tags(Some(tags))
            .send()
            .await;

        match result {
            Ok(_) => Ok(Provisioned::Updated),
            Err(e) if is_no_updates(e.message()) => Ok(Provisioned::UpToDate),
            Err(e) => Err(eyre!("Failed to update stack: {:?}", e.message())),
        }
    }
}
