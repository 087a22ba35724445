use super::Stack;
use aws_sdk_cloudformation::types::DeletionMode;
use eyre::WrapErr;

impl Stack {
    /// Request the stack deletion, returns false if there was nothing to delete
    ///
    /// The force mode skips resources that failed to delete during a previous attempt.
    pub async fn destroy(&self, force: bool) -> eyre::Result<bool> {
        if !self.is_exists().await? {
            log::info!("Stack {} does not exist", self.name);
            return Ok(false);
        }

        let mode = if force {
            DeletionMode::ForceDeleteStack
        } else {
            DeletionMode::Standard
        };

        self.client
            .delete_stack()
            .deletion_mode(mode)
            .stack_name(&self.name)
            .send()
            .await
            .wrap_err(format!("Failed to delete stack \"{}\"", self.name))?;

        Ok(true)
    }
}
