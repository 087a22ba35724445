/// Display global error message in unified format
#[derive(Debug)]
pub struct Error(String, Option<String>);

impl Error {
    pub fn new(message: &str, details: Option<&str>) -> Self {
        Error(message.to_string(), details.map(|d| d.to_string()))
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    pub fn details(&self) -> Option<&str> {
        self.1.as_deref()
    }
}

/// Display the message and details, as sort of a hint
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}\n\n{}",
            self.0,
            console::style(self.1.clone().unwrap_or("".into())).dim()
        )
    }
}

impl std::error::Error for Error {}

/// Automatically convert all eyre error reports
///
/// The outermost message becomes the title, the causes become the hint.
impl From<eyre::ErrReport> for Error {
    fn from(error: eyre::ErrReport) -> Self {
        log::error!("{error:?}");

        match error.downcast::<Error>() {
            Ok(error) => error,
            Err(error) => {
                let causes = error
                    .chain()
                    .skip(1)
                    .map(|cause| cause.to_string())
                    .collect::<Vec<String>>();

                Error::new(
                    &error.to_string(),
                    (!causes.is_empty()).then(|| causes.join("\n")).as_deref(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn causes_become_the_hint() {
        let report = Err::<(), _>(eyre::eyre!("Artifact not found at dist/index.zip, build first"))
            .wrap_err("Failed to compose lambda \"orders\"")
            .unwrap_err();

        let error = Error::from(report);
        assert_eq!(error.0, "Failed to compose lambda \"orders\"");
        assert_eq!(
            error.1.as_deref(),
            Some("Artifact not found at dist/index.zip, build first")
        );
    }

    #[test]
    fn keeps_user_facing_errors() {
        let error = Error::from(eyre::Report::new(Error::new("Stack failed", Some("Check the events"))));

        assert_eq!(error.0, "Stack failed");
        assert_eq!(error.1.as_deref(), Some("Check the events"));
    }
}
