use crate::stack::{Provisioned, Stack};
use crate::template::Template;
use crate::upload::{Upload, Uploader};
use aws_config::SdkConfig;
use common::config::{BucketRef, Tags};
use eyre::WrapErr;

/// Executes a composed template against AWS
///
/// Uploads go first, their keys become the stack parameters.
pub struct Deployment<'a> {
    template: &'a Template,
    uploader: Uploader,
    stack: Stack,
}

/// Distinct buckets the uploads go to, with the tags of the first upload into each
fn buckets(uploads: &[Upload]) -> Vec<(&BucketRef, Option<&Tags>)> {
    let mut result: Vec<(&BucketRef, Option<&Tags>)> = vec![];

    for upload in uploads {
        if !result.iter().any(|(bucket, _)| *bucket == &upload.bucket) {
            result.push((&upload.bucket, upload.tags.as_ref()));
        }
    }

    result
}

impl<'a> Deployment<'a> {
    pub fn new(config: &SdkConfig, template: &'a Template) -> Self {
        Deployment {
            template,
            uploader: Uploader::new(config),
            stack: Stack::new(config, template.stack_name()),
        }
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Make sure the buckets exist and upload the code
    ///
    /// Returns the stack parameters holding the resolved object keys.
    pub async fn upload(&self) -> eyre::Result<Vec<(String, String)>> {
        for (bucket, tags) in buckets(self.template.uploads()) {
            self.uploader.ensure_bucket(bucket, tags).await?;
        }

        let mut parameters = vec![];

        for upload in self.template.uploads() {
            let key = self
                .uploader
                .upload(upload)
                .await
                .wrap_err(format!("Failed to upload {}", upload.name))?;

            parameters.push((upload.parameter(), key));
        }

        Ok(parameters)
    }

    /// Upload the code, then create or update the stack
    ///
    /// Does not wait for the stack operation to finish.
    pub async fn apply(&self) -> eyre::Result<Provisioned> {
        let parameters = self.upload().await?;
        self.stack.provision(self.template, &parameters).await
    }
}
