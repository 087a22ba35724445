use crate::logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{stdout, IsTerminal};
use std::time::Duration;

/// Cargo-like progress of a single stack
pub(crate) struct Progress {
    progress_bar: ProgressBar,
    stack_name: String,
}

pub(crate) enum ProgressStatus {
    Success,
    Warn,
    Error,
}

impl Progress {
    pub(crate) fn new(stack_name: &str) -> Self {
        let progress_bar = Logger::multi_progress().add(ProgressBar::new_spinner());

        progress_bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        Self {
            progress_bar,
            stack_name: stack_name.to_string(),
        }
    }

    /// Print a finished stage above the spinner
    pub(crate) fn log_stage(&self, stage: &str, details: &str) {
        let msg = format!(
            "{} {}",
            console::style(with_padding(stage)).green().bold(),
            details,
        );

        // Terminal or CI/CD?
        if stdout().is_terminal() {
            self.progress_bar.println(msg);
        } else {
            self.progress_bar.suspend(|| {
                println!("{msg}");
            });
        }
    }

    /// Spin while a long stage runs
    pub(crate) fn start(&self, stage: &str) {
        self.progress_bar.set_message(format!(
            "{} {}",
            console::style(with_padding(stage)).cyan().bold(),
            self.stack_name
        ));

        self.progress_bar
            .enable_steady_tick(Duration::from_millis(120));
    }

    pub(crate) fn finish(&self, stage: &str, status: ProgressStatus, message: Option<&str>) {
        let stage = console::style(with_padding(stage)).bold();

        let stage = match status {
            ProgressStatus::Success => stage.green(),
            ProgressStatus::Warn => stage.yellow(),
            ProgressStatus::Error => stage.red(),
        };

        let message = message.map(|m| format!(": {m}")).unwrap_or_default();

        self.progress_bar.set_style(
            ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        self.progress_bar
            .finish_with_message(format!("{} {}{}", stage, self.stack_name, message));
    }

    pub(crate) fn error(&self, stage: &str) {
        self.finish(stage, ProgressStatus::Error, None);
    }
}

/// Required padding to make the message centered in the cargo-like style
fn with_padding(message: &str) -> String {
    format!("{message:>12}")
}
