mod code;
mod error;
mod lambda;
mod runtime;
mod trigger;

pub use code::{BucketRef, CodeSource};
pub use error::ConfigError;
pub use lambda::{handler_file_name, LambdaConfig, Layout};
pub use runtime::Runtime;
pub use trigger::{HttpTrigger, PubSubTrigger, TriggerSpec};

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub type Tags = BTreeMap<String, String>;

pub const CONFIG_FILE_NAME: &str = "lambdaform.toml";

/// The structure of lambdaform.toml
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// [stack]
    /// name = "orders"
    #[serde(default)]
    pub stack: StackSection,

    /// Shared tag set, passed down to every lambda
    #[serde(default)]
    pub tags: Option<Tags>,

    /// [[lambda]]
    #[serde(default, rename = "lambda")]
    pub lambdas: Vec<LambdaConfig>,

    /// Directory containing the config, artifact paths are relative to it
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StackSection {
    #[serde(default)]
    pub name: String,

    /// Bucket for inline code archives, created when missing
    pub assets_bucket: Option<String>,
}

impl Config {
    /// Read and validate the config
    ///
    /// The path is either the config file itself or the directory containing lambdaform.toml.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let toml_string = std::fs::read_to_string(&file).map_err(|source| ConfigError::Read {
            path: file.clone(),
            source,
        })?;

        let root = file.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&toml_string, root)
    }

    /// Parse and validate the config, with artifact paths resolved against `root`
    pub fn parse(toml_string: &str, root: PathBuf) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(toml_string).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.root = root;

        // Fall back to the name of the directory with the config
        if config.stack.name.is_empty() {
            config.stack.name = std::path::absolute(&config.root)
                .ok()
                .and_then(|root| root.file_name().map(|n| n.to_string_lossy().into_owned()))
                .ok_or(ConfigError::MissingStackName)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lambdas.is_empty() {
            return Err(ConfigError::NoLambdas);
        }

        if let Some(tags) = &self.tags {
            validate_tags("tags", tags)?;
        }

        if let Some(bucket) = &self.stack.assets_bucket {
            validate_bucket(bucket)?;
        }

        let mut names = HashSet::new();

        for lambda in &self.lambdas {
            if !names.insert(lambda.name.as_str()) {
                return Err(ConfigError::DuplicateName(lambda.name.clone()));
            }

            lambda.validate(&self.root, self.stack.assets_bucket.as_deref())?;
        }

        Ok(())
    }
}

fn is_match(pattern: &str, value: &str) -> bool {
    regex::Regex::new(pattern)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if !is_match(r"^[A-Za-z][A-Za-z0-9_-]{0,39}$", name) {
        return Err(ConfigError::InvalidName(name.into()));
    }

    Ok(())
}

fn validate_bucket(name: &str) -> Result<(), ConfigError> {
    if !is_match(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$", name) {
        return Err(ConfigError::InvalidBucket(name.into()));
    }

    Ok(())
}

/// Tag sets are never defaulted to an empty map, so an explicit empty one is a mistake
fn validate_tags(scope: &str, tags: &Tags) -> Result<(), ConfigError> {
    if tags.is_empty() {
        return Err(ConfigError::EmptyTags(scope.into()));
    }

    for (key, value) in tags {
        if key.trim().is_empty() || key.len() > 128 || value.len() > 256 || key.starts_with("aws:")
        {
            return Err(ConfigError::InvalidTag {
                scope: scope.into(),
                key: key.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [stack]
        name = "shop"
        assets_bucket = "shop-assets"

        [tags]
        Environment = "dev"
        Project = "shop"

        [[lambda]]
        name = "orders"
        runtime = "nodejs20.x"
        code = { source = "bucket", bucket = { create = "shop-builds" } }
        tags = { Team = "core" }

        [[lambda.triggers]]
        kind = "http"
        path = "/orders"
        method = "POST"
        handler = "apiHandler.handler"

        [[lambda.triggers]]
        kind = "sns"
        handler = "snsHandler.handler"

        [[lambda]]
        name = "notify"
        runtime = "python3.12"
        handler = "main.handler"
        layout = "shared"
        code = { source = "inline", path = "notify" }

        [[lambda.triggers]]
        kind = "pubsub"
        topic_name = "notifications"
    "#;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(CONFIG, PathBuf::from("/project")).unwrap();

        assert_eq!(config.stack.name, "shop");
        assert_eq!(config.lambdas.len(), 2);

        let orders = &config.lambdas[0];
        assert_eq!(orders.runtime, Runtime::Nodejs20);
        assert_eq!(orders.handler, "index.handler");
        assert_eq!(orders.layout, Layout::PerTrigger);
        assert_eq!(orders.bucket(), Some(&BucketRef::Create("shop-builds".into())));
        assert_eq!(orders.triggers[0].kind(), "http");
        assert_eq!(orders.triggers[1].kind(), "pubsub");

        let notify = &config.lambdas[1];
        assert_eq!(notify.layout, Layout::Shared);
        assert_eq!(
            notify.code,
            CodeSource::Inline {
                path: "notify".into()
            }
        );
        assert_eq!(
            notify.triggers[0],
            TriggerSpec::PubSub(PubSubTrigger {
                topic_name: Some("notifications".into()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn rejects_unknown_trigger_kind() {
        let config = CONFIG.replace("kind = \"sns\"", "kind = \"sqs\"");
        let error = Config::parse(&config, PathBuf::from("/project")).unwrap_err();

        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().contains("sqs"));
    }

    #[test]
    fn rejects_unknown_runtime() {
        let config = CONFIG.replace("python3.12", "cobol85");
        let error = Config::parse(&config, PathBuf::from("/project")).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_empty_tag_set() {
        let config = CONFIG.replace("tags = { Team = \"core\" }", "tags = {}");

        assert!(matches!(
            Config::parse(&config, PathBuf::from("/project")),
            Err(ConfigError::EmptyTags(scope)) if scope == "orders"
        ));
    }

    #[test]
    fn inline_code_requires_assets_bucket() {
        let config = CONFIG.replace("assets_bucket = \"shop-assets\"", "");

        assert!(matches!(
            Config::parse(&config, PathBuf::from("/project")),
            Err(ConfigError::MissingAssetsBucket(name)) if name == "notify"
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let config = CONFIG.replace("name = \"notify\"", "name = \"orders\"");

        assert!(matches!(
            Config::parse(&config, PathBuf::from("/project")),
            Err(ConfigError::DuplicateName(_))
        ));
    }

    #[test]
    fn rejects_trigger_overrides_in_shared_layout() {
        let config = CONFIG.replace(
            "topic_name = \"notifications\"",
            "topic_name = \"notifications\"\nhandler = \"other.handler\"",
        );

        assert!(matches!(
            Config::parse(&config, PathBuf::from("/project")),
            Err(ConfigError::SharedOverride(_))
        ));
    }

    #[test]
    fn lambda_without_triggers_is_rejected() {
        let config = r#"
            [[lambda]]
            name = "orders"
            runtime = "nodejs20.x"
            code = { source = "bucket", bucket = { existing = "builds" } }
        "#;

        assert!(matches!(
            Config::parse(config, PathBuf::from("/project")),
            Err(ConfigError::NoTriggers(_))
        ));
    }

    #[test]
    fn reads_from_directory_and_derives_stack_name() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("billing");
        std::fs::create_dir(&project).unwrap();

        std::fs::write(
            project.join(CONFIG_FILE_NAME),
            r#"
                [[lambda]]
                name = "invoices"
                runtime = "provided.al2023"
                handler = "bootstrap"
                code = { source = "bucket", bucket = { existing = "billing-builds" } }

                [[lambda.triggers]]
                kind = "http"
            "#,
        )
        .unwrap();

        let config = Config::from_path(&project).unwrap();

        assert_eq!(config.stack.name, "billing");
        assert_eq!(config.root, project);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Config::from_path(dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }
}
