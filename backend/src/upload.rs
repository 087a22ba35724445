use crate::deferred::Deferred;
use crate::template::Archive;
use aws_config::SdkConfig;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration, Tag, Tagging};
use common::config::{BucketRef, Tags};
use eyre::{eyre, Context};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

/// Content of an upload
#[derive(Clone, Debug)]
pub enum UploadSource {
    /// Prebuilt artifact on the local disk
    File(PathBuf),

    /// Archive built during composition
    Archive(Archive),
}

/// Object key of an upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectKey {
    Fixed(String),

    /// <prefix>-<content digest>.zip, so a rebuilt artifact always changes the key
    ContentAddressed { prefix: String },
}

/// Object upload declared during composition and executed by the apply phase
///
/// The resulting key gets into the template through a stack parameter.
#[derive(Clone, Debug)]
pub struct Upload {
    /// Logical name, the parameter name is derived from it
    pub name: String,

    pub source: UploadSource,
    pub bucket: BucketRef,
    pub key: ObjectKey,
    pub tags: Option<Tags>,
}

impl Upload {
    /// Name of the template parameter receiving the object key
    pub fn parameter(&self) -> String {
        format!("{}Key", self.name)
    }

    /// The object key, known only once the upload is done
    pub fn key(&self) -> Deferred {
        Deferred::parameter(&self.parameter())
    }

    /// True if the upload sends the same local file to the same bucket
    pub(crate) fn is_file(&self, path: &Path, bucket: &BucketRef) -> bool {
        matches!(&self.source, UploadSource::File(p) if p == path) && &self.bucket == bucket
    }

    pub(crate) async fn read(&self) -> eyre::Result<Vec<u8>> {
        match &self.source {
            UploadSource::File(path) => tokio::fs::read(path)
                .await
                .wrap_err(format!("Could not read the file \"{}\"", path.display())),

            UploadSource::Archive(archive) => Ok(archive.bytes().to_vec()),
        }
    }

    pub(crate) fn object_key(&self, content: &[u8]) -> String {
        match &self.key {
            ObjectKey::Fixed(key) => key.clone(),
            ObjectKey::ContentAddressed { prefix } => {
                format!("{prefix}-{}.zip", &sha256::digest(content)[..16])
            }
        }
    }
}

/// URL query encoded tags, the format S3 expects in x-amz-tagging
fn tagging_header(tags: &Tags) -> String {
    tags.iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, NON_ALPHANUMERIC),
                utf8_percent_encode(v, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<String>>()
        .join("&")
}

/// Executes declared uploads against S3
#[derive(Clone, Debug)]
pub struct Uploader {
    client: aws_sdk_s3::Client,
}

impl Uploader {
    pub fn new(config: &SdkConfig) -> Self {
        Uploader {
            client: aws_sdk_s3::Client::new(config),
        }
    }

    async fn is_exists(&self, name: &str) -> eyre::Result<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(e) => Err(eyre!("Failed to check bucket \"{name}\": {:?}", e.code())),
        }
    }

    /// Make sure the bucket exists, creating a managed one when missing
    pub async fn ensure_bucket(&self, bucket: &BucketRef, tags: Option<&Tags>) -> eyre::Result<()> {
        let name = bucket.name();

        if self.is_exists(name).await? {
            log::debug!("Bucket {name} exists");
            return Ok(());
        }

        if !bucket.is_managed() {
            return Err(eyre!("Bucket \"{name}\" does not exist"));
        }

        log::info!("Creating bucket {name}");
        let mut request = self.client.create_bucket().bucket(name);

        // us-east-1 is the only region rejecting an explicit location constraint
        if let Some(region) = self.client.config().region() {
            if region.as_ref() != "us-east-1" {
                request = request.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(region.as_ref()))
                        .build(),
                );
            }
        }

        request
            .send()
            .await
            .wrap_err(format!("Failed to create bucket \"{name}\""))?;

        let Some(tags) = tags else {
            return Ok(());
        };

        let tag_set = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect::<Result<Vec<Tag>, _>>()
            .wrap_err("Failed to build S3 tag")?;

        self.client
            .put_bucket_tagging()
            .bucket(name)
            .tagging(
                Tagging::builder()
                    .set_tag_set(Some(tag_set))
                    .build()
                    .wrap_err("Failed to build S3 tagging")?,
            )
            .send()
            .await
            .wrap_err(format!("Failed to tag bucket \"{name}\""))?;

        Ok(())
    }

    /// Upload the object, returns the resolved key
    pub async fn upload(&self, upload: &Upload) -> eyre::Result<String> {
        let content = upload.read().await?;
        let key = upload.object_key(&content);
        let bucket = upload.bucket.name();
        log::info!("Uploading {} bytes to s3://{bucket}/{key}", content.len());

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(ByteStream::from(content));

        if let Some(tags) = &upload.tags {
            request = request.tagging(tagging_header(tags));
        }

        request
            .send()
            .await
            .wrap_err(format!("Failed to upload s3://{bucket}/{key}"))?;

        Ok(key)
    }
}
