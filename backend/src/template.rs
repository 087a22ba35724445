mod code;
mod function;
mod role;
#[allow(clippy::module_inception)]
mod template;
mod trigger;

pub use code::{Archive, PackagedCode};
pub use function::Function;
pub use role::Role;
pub use template::{Export, Template};
pub use trigger::FrontDoorBinding;

use common::config::Tags;
use serde_json::{json, Value};

/// A named entry of the Resources section
#[derive(Clone, Debug)]
pub struct CfnResource {
    pub name: String,
    pub resource: Value,
}

/// Tags in the [{"Key": .., "Value": ..}] form most resource types use
pub(crate) fn tag_list(tags: &Tags) -> Value {
    tags.iter()
        .map(|(key, value)| json!({"Key": key, "Value": value}))
        .collect()
}

/// Tags as a plain map, ApiGatewayV2 resources want this form
pub(crate) fn tag_map(tags: &Tags) -> Value {
    json!(tags)
}
