mod commands;
mod error;
mod logger;
mod progress;
mod runner;
mod writer;
use crate::commands::Commands;
use crate::error::Error;
use crate::logger::Logger;
use crate::runner::{Runnable, Runner};
use crate::writer::Writer;
use clap::Parser;
use common::config::CONFIG_FILE_NAME;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "lambdaform",
    version,
    about = "Deploy AWS Lambda functions behind HTTP APIs and SNS topics",
    long_about = None
)]
struct Cli {
    /// Path to the config file, or to the directory containing it
    #[arg(short, long, global = true, value_name = "PATH", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
async fn run(command: impl Runnable, writer: &Writer, config: &Path) -> Result<(), Error> {
    command.runner(writer, config).run().await
}

#[tokio::main]
async fn main() {
    Logger::init();
    let cli = Cli::parse();
    let writer = Writer::new(cli.json);
    let config = cli.config.as_path();

    // Match all commands here, in one place
    let result = match cli.command {
        Commands::Plan(cmd) => run(cmd, &writer, config).await,
        Commands::Deploy(cmd) => run(cmd, &writer, config).await,
        Commands::Status(cmd) => run(cmd, &writer, config).await,
        Commands::Outputs(cmd) => run(cmd, &writer, config).await,
        Commands::Destroy(cmd) => run(cmd, &writer, config).await,
    };

    if let Err(error) = result {
        if writer.failure(&error).is_err() {
            eprintln!("{}", error.message());
        }

        // The Error is a terminating one
        std::process::exit(1)
    }
}
