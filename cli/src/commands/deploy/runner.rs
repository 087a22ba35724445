use crate::commands::deploy::DeployCommand;
use crate::error::Error;
use crate::progress::{Progress, ProgressStatus};
use crate::runner::{Context, Runner};
use backend::{Deployment, Provisioned, StackOutputs, Template};
use common::stack::status::StackStatus;
use serde_json::{json, Map, Value};
use std::path::Path;

pub(crate) struct DeployRunner<'a> {
    pub(crate) command: DeployCommand,
    pub(crate) context: Context<'a>,
}

impl Runner for DeployRunner<'_> {
    fn config_path(&self) -> &Path {
        &self.context.config
    }

    /// Compose, upload the code, then create or update the stack
    async fn run(&mut self) -> Result<(), Error> {
        let template = self.template()?;
        let progress = Progress::new(template.stack_name());

        progress.log_stage(
            "Composed",
            &format!(
                "{} function(s), {} trigger(s), {} upload(s)",
                template.functions().len(),
                template.bindings().len(),
                template.uploads().len()
            ),
        );

        let sdk_config = backend::sdk_config().await;
        let deployment = Deployment::new(&sdk_config, &template);
        progress.start("Deploying");

        let provisioned = deployment.apply().await.inspect_err(|_| {
            progress.error("Deploying");
        })?;

        let stack = deployment.stack();

        match provisioned {
            Provisioned::UpToDate => {
                progress.finish("Up to date", ProgressStatus::Success, None);
            }

            _ if self.command.no_wait => {
                progress.finish("Requested", ProgressStatus::Success, None);

                return self
                    .context
                    .writer
                    .json(json!({"stack": stack.name, "status": "IN_PROGRESS"}));
            }

            _ => {
                progress.start("Waiting");

                match stack.wait().await? {
                    StackStatus::Complete => {
                        progress.finish("Deployed", ProgressStatus::Success, None);
                    }

                    StackStatus::Failed { errors } => {
                        progress.error("Failed");

                        return Err(self.error(
                            Some("Deployment failed"),
                            Some(&errors.join("\n")),
                            None,
                        ));
                    }

                    status => {
                        progress.finish("Deploying", ProgressStatus::Warn, Some(&status.to_string()));
                    }
                }
            }
        }

        let outputs = stack.outputs().await?;
        self.show(&template, &outputs)
    }
}

impl DeployRunner<'_> {
    /// Print the resolved exports, e.g. API endpoints
    fn show(&self, template: &Template, outputs: &StackOutputs) -> Result<(), Error> {
        let writer = self.context.writer;
        let mut resolved = Map::new();

        for export in template.exports() {
            let Some(value) = export.value.resolve(outputs) else {
                log::warn!("Output {} is missing", export.value.key());
                continue;
            };

            resolved.insert(export.value.key().into(), Value::String(value.into()));

            writer.text(&format!(
                "{} {value}\n",
                console::style(format!("{}:", export.description)).dim()
            ))?;
        }

        writer.json(json!({
            "stack": template.stack_name(),
            "status": "COMPLETE",
            "outputs": resolved,
        }))
    }
}
