mod apply;
mod config;
pub mod deferred;
pub mod stack;
pub mod template;
pub mod upload;

pub use apply::Deployment;
pub use deferred::{Deferred, StackOutputs};
pub use stack::{Provisioned, Stack};
pub use template::Template;

use aws_config::{BehaviorVersion, SdkConfig};

/// AWS config from the environment, the usual credential and region chain
pub async fn sdk_config() -> SdkConfig {
    aws_config::defaults(BehaviorVersion::v2025_01_17())
        .load()
        .await
}
