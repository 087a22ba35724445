use crate::error::Error;
use crate::writer::Writer;
use backend::{Stack, Template};
use common::config::Config;
use common::template::sanitize::stack_name;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};

pub(crate) trait Runner {
    /// Path to lambdaform.toml, or to the directory containing it
    fn config_path(&self) -> &Path;

    /// Read and validate the config
    fn config(&self) -> Result<Config, Error> {
        Config::from_path(self.config_path()).map_err(|e| {
            self.error(
                Some("Invalid config"),
                Some(&e.to_string()),
                Some(Box::new(e)),
            )
        })
    }

    /// Compose the deployment described by the config
    fn template(&self) -> Result<Template, Error> {
        Ok(Template::new(&self.config()?)?)
    }

    /// The stack of the config, it is not required to exist
    async fn stack(&self) -> Result<Stack, Error> {
        let config = self.config()?;
        let sdk_config = backend::sdk_config().await;
        Ok(Stack::new(&sdk_config, &stack_name(&config.stack.name)))
    }

    /// Run the command
    ///
    /// Returns an error shown to the user in case of failure
    async fn run(&mut self) -> Result<(), Error>;

    /// Construct an error shown to the user
    fn error(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        origin: Option<Box<dyn StdError>>,
    ) -> Error {
        if let Some(origin) = origin {
            log::error!("{origin:?}");
        }

        if let Some(title) = title {
            Error::new(title, description)
        } else {
            Error::new(
                "Failed to run the command",
                Some("Run again with LAMBDAFORM_LOG=debug for details"),
            )
        }
    }
}

/// Return a runner for a command
pub(crate) trait Runnable {
    fn runner<'a>(&self, writer: &'a Writer, config: &Path) -> impl Runner + 'a;
}

/// Fields every runner carries
pub(crate) struct Context<'a> {
    pub(crate) writer: &'a Writer,
    pub(crate) config: PathBuf,
}
