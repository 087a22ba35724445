use crate::error::Error;
use serde_json::{json, Value};
use std::io::{Stderr, Stdout, Write};

/// Write all stdout/stderr outputs in the app
///
/// Plain text mode is meant for humans: stage lines, summaries and errors, with
/// errors going to stderr.
///
/// Structured mode (--json) is meant for scripts. Every command prints exactly
/// one JSON document on a single stdout line, e.g. `{"stack": "shop", "status":
/// "COMPLETE"}`, and a failed command prints `{"error": .., "details": ..}`
/// instead. Plain text is dropped, so stdout always parses.
#[derive(Default)]
pub(crate) struct Writer {
    is_structured: bool,
}

impl Writer {
    pub(crate) fn new(is_structured: bool) -> Self {
        Writer { is_structured }
    }

    /// Output plain text, dropped with a warning in structured mode
    pub(crate) fn text(&self, output: &str) -> Result<(), Error> {
        if self.is_structured {
            log::warn!("Skipping output (not structured data): {output}");
            return Ok(());
        }

        self.write(output, false)
    }

    /// Output the command's result document, dropped with a warning in plain text mode
    pub(crate) fn json(&self, output: Value) -> Result<(), Error> {
        if !self.is_structured {
            log::warn!("Skipping output (not plain text): {output}");
            return Ok(());
        }

        self.write(&document(&output), false)
    }

    /// Output plain text in stderr
    pub(crate) fn error(&self, output: &str) -> Result<(), Error> {
        if self.is_structured {
            log::warn!("Skipping output (not structured data): {output}");
            return Ok(());
        }

        self.write(output, true)
    }

    /// Report the error a command terminated with, in either mode
    pub(crate) fn failure(&self, error: &Error) -> Result<(), Error> {
        if self.is_structured {
            return self.write(&document(&error_document(error)), false);
        }

        self.error(&format!(
            "\n{}\n{error}\n",
            console::style("Error").red().bold()
        ))
    }

    /// General method for writing to stdout/stderr
    fn write(&self, output: &str, is_error: bool) -> Result<(), Error> {
        let mut stderr: Stderr = std::io::stderr();
        let mut stdout: Stdout = std::io::stdout();
        let stream: &mut dyn Write = if is_error { &mut stderr } else { &mut stdout };

        stream.write_all(output.as_bytes()).map_err(|e| {
            log::error!("Error while writing to std*: {e:?}");
            Error::new("Output error", Some("Could not write to the terminal"))
        })
    }

    pub(crate) fn is_structured(&self) -> bool {
        self.is_structured
    }
}

/// A JSON document on a line of its own
fn document(output: &Value) -> String {
    format!("{output}\n")
}

fn error_document(error: &Error) -> Value {
    json!({"error": error.message(), "details": error.details()})
}
