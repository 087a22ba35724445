use super::Stack;
use crate::deferred::StackOutputs;
use eyre::ContextCompat;

impl Stack {
    /// Outputs of the applied stack, the resolved deferred values
    pub async fn outputs(&self) -> eyre::Result<StackOutputs> {
        let stack = self
            .describe()
            .await?
            .wrap_err(format!("Stack \"{}\" does not exist", self.name))?;

        Ok(stack
            .outputs()
            .iter()
            .filter_map(|output| {
                Some((
                    output.output_key()?.to_string(),
                    output.output_value()?.to_string(),
                ))
            })
            .collect())
    }
}
