use crate::deferred::Deferred;
use crate::upload::{ObjectKey, Upload, UploadSource};
use common::config::{BucketRef, Tags};
use common::template::sanitize::logical_id;
use eyre::{eyre, WrapErr};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// Code a function is deployed from
///
/// A function always has exactly one of the representations.
#[derive(Clone, Debug)]
pub enum PackagedCode {
    /// Archive zipped from a local directory and staged to the assets bucket
    Archive {
        digest: String,
        bucket: String,
        key: Deferred,
    },

    /// Prebuilt artifact uploaded to a bucket
    Object { bucket: String, key: Deferred },
}

impl PackagedCode {
    /// Value of the Code property of AWS::Lambda::Function
    pub fn to_json(&self) -> Value {
        match self {
            PackagedCode::Archive { bucket, key, .. } | PackagedCode::Object { bucket, key } => {
                json!({"S3Bucket": bucket, "S3Key": key})
            }
        }
    }

    pub fn key(&self) -> &Deferred {
        match self {
            PackagedCode::Archive { key, .. } | PackagedCode::Object { key, .. } => key,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, PackagedCode::Archive { .. })
    }
}

/// Zip archive of a directory, built in memory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archive {
    bytes: Vec<u8>,
    digest: String,
}

impl Archive {
    /// Zip the directory
    ///
    /// Entries are sorted and timestamps are fixed, so the same content always
    /// gives the same digest.
    pub fn from_dir(dir: &Path) -> eyre::Result<Self> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.wrap_err("Failed to walk the directory")?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry
                .path()
                .strip_prefix(dir)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let options = SimpleFileOptions::default()
                .last_modified_time(zip::DateTime::default())
                .unix_permissions(if is_executable(entry.path()) {
                    0o755
                } else {
                    0o644
                });

            zip.start_file(name, options)
                .wrap_err("Could not open ZIP file")?;

            zip.write_all(&std::fs::read(entry.path())?)
                .wrap_err("Could not write to ZIP file")?;
        }

        let bytes = zip
            .finish()
            .wrap_err("Could not close ZIP file")?
            .into_inner();

        Ok(Archive {
            digest: sha256::digest(bytes.as_slice()),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}

/// Declare the upload of a prebuilt artifact
///
/// Fails without declaring anything if the artifact is missing. Functions
/// sharing an artifact share the upload.
pub(crate) fn object(
    lambda: &str,
    artifact: &Path,
    bucket: &BucketRef,
    key: Option<&str>,
    tags: Option<&Tags>,
    uploads: &mut Vec<Upload>,
) -> eyre::Result<PackagedCode> {
    if !artifact.is_file() {
        return Err(eyre!(
            "Artifact not found at {}, build first",
            artifact.display()
        ));
    }

    let index = match uploads.iter().position(|u| u.is_file(artifact, bucket)) {
        Some(index) => index,
        None => {
            let stem = artifact
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let name = upload_name(&logical_id(&[lambda, &stem]), uploads);

            uploads.push(Upload {
                name,
                source: UploadSource::File(artifact.to_path_buf()),
                bucket: bucket.clone(),
                key: match key {
                    Some(key) => ObjectKey::Fixed(key.into()),
                    None => ObjectKey::ContentAddressed {
                        prefix: format!("{lambda}/{stem}"),
                    },
                },
                tags: tags.cloned(),
            });

            uploads.len() - 1
        }
    };

    Ok(PackagedCode::Object {
        bucket: bucket.name().into(),
        key: uploads[index].key(),
    })
}

/// Name of a new artifact upload, numbered when another artifact of the same stem took it
fn upload_name(base: &str, uploads: &[Upload]) -> String {
    let is_taken = |name: &str| uploads.iter().any(|u| u.name == name);
    let mut name = format!("{base}Artifact");
    let mut index = 1;

    while is_taken(&name) {
        index += 1;
        name = format!("{base}{index}Artifact");
    }

    name
}

/// Zip a local directory and declare its upload to the assets bucket
pub(crate) fn inline(
    lambda: &str,
    dir: &Path,
    assets_bucket: &str,
    tags: Option<&Tags>,
    uploads: &mut Vec<Upload>,
) -> eyre::Result<PackagedCode> {
    if !dir.is_dir() {
        return Err(eyre!("Code directory not found at {}", dir.display()));
    }

    let archive = Archive::from_dir(dir)
        .wrap_err(format!("Failed to archive {}", dir.display()))?;

    let name = format!("{}Archive", logical_id(&[lambda]));
    let digest = archive.digest().to_string();

    // Shared layout packages the directory once, per-trigger one does it for each function
    if let Some(upload) = uploads.iter().find(|u| u.name == name) {
        return Ok(PackagedCode::Archive {
            digest,
            bucket: assets_bucket.into(),
            key: upload.key(),
        });
    }

    let upload = Upload {
        name,
        source: UploadSource::Archive(archive),
        bucket: BucketRef::Create(assets_bucket.into()),
        key: ObjectKey::ContentAddressed {
            prefix: lambda.into(),
        },
        tags: tags.cloned(),
    };

    let key = upload.key();
    uploads.push(upload);

    Ok(PackagedCode::Archive {
        digest,
        bucket: assets_bucket.into(),
        key,
    })
}
