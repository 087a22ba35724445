use super::{BucketRef, CodeSource, ConfigError, Runtime, Tags, TriggerSpec};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// How triggers map to deployed functions
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// A separate function for every trigger
    #[default]
    PerTrigger,

    /// One function behind all the triggers
    Shared,
}

/// [[lambda]] section, a single deployment unit
#[derive(Clone, Debug, Deserialize)]
pub struct LambdaConfig {
    pub name: String,
    pub runtime: Runtime,

    #[serde(default = "default_handler")]
    pub handler: String,

    #[serde(default)]
    pub layout: Layout,

    pub code: CodeSource,

    /// Merged over the shared [tags] section
    #[serde(default)]
    pub tags: Option<Tags>,

    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

fn default_handler() -> String {
    "index.handler".into()
}

/// File part of a handler reference, e.g. "src/apiHandler.handler" gives "apiHandler"
pub fn handler_file_name(handler: &str) -> &str {
    let file = handler.rsplit_once('.').map_or(handler, |(file, _)| file);
    file.rsplit('/').next().unwrap_or(file)
}

impl LambdaConfig {
    /// Handler used by a function serving the trigger
    pub fn handler_for<'a>(&'a self, trigger: Option<&'a TriggerSpec>) -> &'a str {
        trigger
            .and_then(TriggerSpec::handler)
            .unwrap_or(&self.handler)
    }

    /// Local build artifact for a function serving the trigger
    ///
    /// None for inline code. Relative paths are resolved against the project root.
    pub fn artifact_for(&self, root: &Path, trigger: Option<&TriggerSpec>) -> Option<PathBuf> {
        let CodeSource::Bucket { artifact, .. } = &self.code else {
            return None;
        };

        let path = trigger
            .and_then(TriggerSpec::artifact)
            .or(artifact.as_deref())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| {
                PathBuf::from("dist").join(format!(
                    "{}.zip",
                    handler_file_name(self.handler_for(trigger))
                ))
            });

        Some(root.join(path))
    }

    /// Tags of this lambda on top of the shared ones
    pub fn tags_with(&self, shared: Option<&Tags>) -> Option<Tags> {
        match (shared, &self.tags) {
            (None, None) => None,
            (shared, own) => {
                let mut tags = shared.cloned().unwrap_or_default();
                tags.extend(own.iter().flatten().map(|(k, v)| (k.clone(), v.clone())));
                Some(tags)
            }
        }
    }

    pub(super) fn validate(
        &self,
        root: &Path,
        assets_bucket: Option<&str>,
    ) -> Result<(), ConfigError> {
        super::validate_name(&self.name)?;

        if self.handler.trim().is_empty() {
            return Err(ConfigError::EmptyHandler(self.name.clone()));
        }

        if self.triggers.is_empty() {
            return Err(ConfigError::NoTriggers(self.name.clone()));
        }

        if let Some(tags) = &self.tags {
            super::validate_tags(&self.name, tags)?;
        }

        for trigger in &self.triggers {
            trigger.validate(&self.name)?;
        }

        if self.layout == Layout::Shared
            && self
                .triggers
                .iter()
                .any(|t| t.handler().is_some() || t.artifact().is_some())
        {
            return Err(ConfigError::SharedOverride(self.name.clone()));
        }

        match &self.code {
            CodeSource::Inline { .. } if assets_bucket.is_none() => {
                Err(ConfigError::MissingAssetsBucket(self.name.clone()))
            }

            CodeSource::Inline { .. } => Ok(()),

            CodeSource::Bucket { bucket, key, .. } => {
                super::validate_bucket(bucket.name())?;

                if key.is_some() && self.artifacts(root).len() > 1 {
                    return Err(ConfigError::AmbiguousKey(self.name.clone()));
                }

                Ok(())
            }
        }
    }

    /// Distinct artifacts the lambda resolves to
    fn artifacts(&self, root: &Path) -> BTreeSet<PathBuf> {
        match self.layout {
            Layout::Shared => self.artifact_for(root, None).into_iter().collect(),
            Layout::PerTrigger => self
                .triggers
                .iter()
                .filter_map(|t| self.artifact_for(root, Some(t)))
                .collect(),
        }
    }

    /// Bucket the packaged code goes to, None for inline code
    pub fn bucket(&self) -> Option<&BucketRef> {
        match &self.code {
            CodeSource::Bucket { bucket, .. } => Some(bucket),
            CodeSource::Inline { .. } => None,
        }
    }
}
