use crate::error::Error;
use crate::runner::{Context, Runnable, Runner};
use crate::writer::Writer;
use common::stack::status::StackStatus;
use std::path::Path;

#[derive(clap::Args, Clone)]
pub(crate) struct StatusCommand {}

impl Runnable for StatusCommand {
    fn runner<'a>(&self, writer: &'a Writer, config: &Path) -> impl Runner + 'a {
        StatusRunner {
            context: Context {
                writer,
                config: config.into(),
            },
        }
    }
}

struct StatusRunner<'a> {
    context: Context<'a>,
}

impl Runner for StatusRunner<'_> {
    fn config_path(&self) -> &Path {
        &self.context.config
    }

    async fn run(&mut self) -> Result<(), Error> {
        let stack = self.stack().await?;
        let status = stack.status().await?;
        let writer = self.context.writer;

        writer.json(serde_json::to_value(&status).map_err(|e| {
            self.error(Some("Failed to serialize the status"), None, Some(Box::new(e)))
        })?)?;

        let styled = match &status {
            StackStatus::Complete => console::style(status.to_string()).green(),
            StackStatus::Failed { .. } => console::style(status.to_string()).red(),
            _ => console::style(status.to_string()).yellow(),
        };

        writer.text(&format!(
            "{} {}: {}\n",
            console::style("Stack").bold(),
            stack.name,
            styled.bold()
        ))?;

        if let StackStatus::Failed { errors } = &status {
            for error in errors {
                writer.text(&format!("  {}\n", console::style(error).dim()))?;
            }
        }

        Ok(())
    }
}
