use crate::error::Error;
use crate::progress::{Progress, ProgressStatus};
use crate::runner::{Context, Runnable, Runner};
use crate::writer::Writer;
use common::stack::status::StackStatus;
use serde_json::json;
use std::io::{self, Write};
use std::path::Path;

#[derive(clap::Args, Clone)]
pub(crate) struct DestroyCommand {
    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Skip resources which failed to delete during a previous attempt
    #[arg(long)]
    force: bool,

    /// Return right after the deletion is requested
    #[arg(long)]
    no_wait: bool,
}

impl Runnable for DestroyCommand {
    fn runner<'a>(&self, writer: &'a Writer, config: &Path) -> impl Runner + 'a {
        DestroyRunner {
            command: self.clone(),
            context: Context {
                writer,
                config: config.into(),
            },
        }
    }
}

struct DestroyRunner<'a> {
    command: DestroyCommand,
    context: Context<'a>,
}

impl DestroyRunner<'_> {
    fn confirm(&self) -> Result<bool, Error> {
        if self.context.writer.is_structured() {
            return Err(self.error(
                Some("Confirmation required"),
                Some("Pass --yes to destroy a stack in JSON mode"),
                None,
            ));
        }

        print!(
            "{} {}: ",
            console::style("Do you want to proceed?").bold(),
            console::style("[y/N]").dim()
        );

        let mut input = String::new();

        io::stdout()
            .flush()
            .and_then(|_| io::stdin().read_line(&mut input))
            .map_err(|e| self.error(Some("Failed to read input"), None, Some(Box::new(e))))?;

        Ok(matches!(input.trim().to_lowercase().as_ref(), "y" | "yes"))
    }
}

impl Runner for DestroyRunner<'_> {
    fn config_path(&self) -> &Path {
        &self.context.config
    }

    async fn run(&mut self) -> Result<(), Error> {
        let stack = self.stack().await?;
        let writer = self.context.writer;

        if !self.command.yes && !self.confirm()? {
            writer.text(&format!("{}\n", console::style("Destroying canceled").dim().bold()))?;
            return Ok(());
        }

        let progress = Progress::new(&stack.name);
        progress.start("Destroying");

        let is_requested = stack.destroy(self.command.force).await.inspect_err(|_| {
            progress.error("Destroying");
        })?;

        if !is_requested {
            progress.finish("Skipped", ProgressStatus::Warn, Some("no such stack"));
            return writer.json(json!({"stack": stack.name, "status": "MISSING"}));
        }

        if self.command.no_wait {
            progress.finish("Requested", ProgressStatus::Success, None);
            return writer.json(json!({"stack": stack.name, "status": "IN_PROGRESS"}));
        }

        match stack.wait().await? {
            // A deleted stack is no longer found by name
            StackStatus::Missing | StackStatus::Complete => {
                progress.finish("Destroyed", ProgressStatus::Success, None);
                writer.json(json!({"stack": stack.name, "status": "DESTROYED"}))
            }

            StackStatus::Failed { errors } => {
                progress.error("Failed");

                Err(self.error(
                    Some("Failed to destroy the stack"),
                    Some(&format!("{}\nRetry with --force to skip these resources", errors.join("\n"))),
                    None,
                ))
            }

            StackStatus::InProgress => {
                progress.finish("Requested", ProgressStatus::Warn, Some("still in progress"));
                writer.json(json!({"stack": stack.name, "status": "IN_PROGRESS"}))
            }
        }
    }
}
