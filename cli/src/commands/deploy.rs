mod runner;
use crate::runner::{Context, Runnable, Runner};
use crate::writer::Writer;
use runner::DeployRunner;
use std::path::Path;

#[derive(clap::Args, Clone)]
pub(crate) struct DeployCommand {
    /// Return right after the stack operation is requested
    #[arg(long)]
    no_wait: bool,
}

impl Runnable for DeployCommand {
    fn runner<'a>(&self, writer: &'a Writer, config: &Path) -> impl Runner + 'a {
        DeployRunner {
            command: self.clone(),
            context: Context {
                writer,
                config: config.into(),
            },
        }
    }
}
