use std::path::PathBuf;

/// Reasons a lambdaform.toml gets rejected before anything is declared
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Stack name is not set and cannot be derived from the config location")]
    MissingStackName,

    #[error("No [[lambda]] sections defined")]
    NoLambdas,

    #[error("Invalid name \"{0}\", use letters, digits, \"-\" and \"_\", starting with a letter")]
    InvalidName(String),

    #[error("Lambda name \"{0}\" is used more than once")]
    DuplicateName(String),

    #[error("Lambda \"{0}\" has no triggers")]
    NoTriggers(String),

    #[error("Lambda \"{0}\" has an empty handler reference")]
    EmptyHandler(String),

    #[error("Tag set of \"{0}\" is empty, remove it or add tags")]
    EmptyTags(String),

    #[error("Invalid tag \"{key}\" in \"{scope}\"")]
    InvalidTag { scope: String, key: String },

    #[error("Invalid bucket name \"{0}\"")]
    InvalidBucket(String),

    #[error("Lambda \"{0}\" uses inline code, but [stack] assets_bucket is not set")]
    MissingAssetsBucket(String),

    #[error("Lambda \"{0}\" sets an explicit object key, but its triggers resolve to several artifacts")]
    AmbiguousKey(String),

    #[error("Lambda \"{0}\" uses the shared layout, triggers cannot override handler or artifact")]
    SharedOverride(String),

    #[error("Unsupported HTTP method \"{method}\" in \"{lambda}\"")]
    InvalidMethod { lambda: String, method: String },

    #[error("HTTP path \"{path}\" in \"{lambda}\" must start with \"/\"")]
    InvalidPath { lambda: String, path: String },
}
