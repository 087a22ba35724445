use serde::Deserialize;
use std::path::PathBuf;

/// Where the function code comes from
///
/// code = { source = "inline", path = "handlers" }
/// code = { source = "bucket", bucket = { existing = "my-builds" } }
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CodeSource {
    /// Directory zipped at composition time and staged to the assets bucket
    Inline { path: PathBuf },

    /// Prebuilt artifact uploaded to a bucket
    Bucket {
        bucket: BucketRef,

        /// Exact object key, content addressed when omitted
        #[serde(default)]
        key: Option<String>,

        /// Defaults to dist/<handler file name>.zip
        #[serde(default)]
        artifact: Option<PathBuf>,
    },
}

/// A bucket either reused as is or created when missing
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BucketRef {
    Existing(String),
    Create(String),
}

impl BucketRef {
    pub fn name(&self) -> &str {
        match self {
            BucketRef::Existing(name) | BucketRef::Create(name) => name,
        }
    }

    /// True if the bucket should be created when it does not exist
    pub fn is_managed(&self) -> bool {
        matches!(self, BucketRef::Create(_))
    }
}
