use crate::error::Error;
use crate::runner::{Context, Runnable, Runner};
use crate::writer::Writer;
use backend::template::FrontDoorBinding;
use backend::upload::UploadSource;
use backend::Template;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(clap::Args, Clone)]
pub(crate) struct PlanCommand {
    /// Write the template to a file instead of printing it
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,
}

impl Runnable for PlanCommand {
    fn runner<'a>(&self, writer: &'a Writer, config: &Path) -> impl Runner + 'a {
        PlanRunner {
            command: self.clone(),
            context: Context {
                writer,
                config: config.into(),
            },
        }
    }
}

struct PlanRunner<'a> {
    command: PlanCommand,
    context: Context<'a>,
}

impl Runner for PlanRunner<'_> {
    fn config_path(&self) -> &Path {
        &self.context.config
    }

    /// Compose the deployment and show what would be applied
    async fn run(&mut self) -> Result<(), Error> {
        let template = self.template()?;
        let body = template.body()?;
        let writer = self.context.writer;

        if let Some(out) = &self.command.out {
            std::fs::write(out, &body).map_err(|e| {
                self.error(
                    Some("Failed to write the template"),
                    Some(&out.display().to_string()),
                    Some(Box::new(e)),
                )
            })?;
        } else {
            writer.text(&format!("{body}\n\n"))?;
        }

        writer.text(&summary(&template))?;

        writer.json(json!({
            "stack": template.stack_name(),
            "template": template.to_json(),
            "uploads": uploads(&template),
        }))
    }
}

fn source(source: &UploadSource) -> String {
    match source {
        UploadSource::File(path) => path.display().to_string(),
        UploadSource::Archive(archive) => format!("archive {}", &archive.digest()[..12]),
    }
}

fn uploads(template: &Template) -> Vec<Value> {
    template
        .uploads()
        .iter()
        .map(|upload| {
            json!({
                "name": upload.name,
                "source": source(&upload.source),
                "bucket": upload.bucket.name(),
                "parameter": upload.parameter(),
            })
        })
        .collect()
}

/// Functions with their triggers, then the uploads
fn summary(template: &Template) -> String {
    let mut lines = vec![format!(
        "{} {}",
        console::style("Stack").bold(),
        template.stack_name()
    )];

    for function in template.functions() {
        lines.push(format!(
            "  {} {} {}",
            console::style("Function").bold(),
            function.function_name,
            console::style(format!("({}, {})", function.runtime, function.handler)).dim()
        ));

        for binding in template
            .bindings()
            .iter()
            .filter(|b| b.function() == function.logical)
        {
            lines.push(match binding {
                FrontDoorBinding::Http { route_key, .. } => format!("    http {route_key}"),
                FrontDoorBinding::PubSub { topic, .. } => format!("    pubsub {topic}"),
            });
        }
    }

    for upload in template.uploads() {
        lines.push(format!(
            "  {} {} -> s3://{}",
            console::style("Upload").bold(),
            source(&upload.source),
            upload.bucket.name()
        ));
    }

    lines.push(String::new());
    lines.join("\n")
}
