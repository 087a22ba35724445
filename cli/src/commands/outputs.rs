use crate::error::Error;
use crate::runner::{Context, Runnable, Runner};
use crate::writer::Writer;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(clap::Args, Clone)]
pub(crate) struct OutputsCommand {}

impl Runnable for OutputsCommand {
    fn runner<'a>(&self, writer: &'a Writer, config: &Path) -> impl Runner + 'a {
        OutputsRunner {
            context: Context {
                writer,
                config: config.into(),
            },
        }
    }
}

struct OutputsRunner<'a> {
    context: Context<'a>,
}

impl Runner for OutputsRunner<'_> {
    fn config_path(&self) -> &Path {
        &self.context.config
    }

    async fn run(&mut self) -> Result<(), Error> {
        let stack = self.stack().await?;

        if !stack.is_exists().await? {
            return Err(self.error(
                Some("Stack not found"),
                Some(&format!("Run `lambdaform deploy` to create \"{}\"", stack.name)),
                None,
            ));
        }

        let outputs = stack.outputs().await?;
        let writer = self.context.writer;

        writer.json(Value::Object(
            outputs
                .sorted()
                .into_iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect::<Map<String, Value>>(),
        ))?;

        if outputs.is_empty() {
            writer.text(&format!("{}\n", console::style("No outputs").yellow()))?;
        }

        for (key, value) in outputs.sorted() {
            writer.text(&format!("{} {value}\n", console::style(key).bold()))?;
        }

        Ok(())
    }
}
