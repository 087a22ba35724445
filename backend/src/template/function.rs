use super::{tag_list, CfnResource, PackagedCode, Role};
use crate::config::config;
use crate::deferred::Deferred;
use common::config::{Runtime, Tags};
use common::template::sanitize::function_name;
use serde_json::json;

/// A declared Lambda function
#[derive(Clone, Debug)]
pub struct Function {
    /// User facing name, e.g. "orders-http"
    pub name: String,

    /// Logical ID in the template
    pub logical: String,

    /// Physical name of the deployed function
    pub function_name: String,

    pub handler: String,
    pub runtime: Runtime,
    pub code: PackagedCode,

    /// Logical ID of the execution role
    pub role: String,

    pub arn: Deferred,
}

impl Function {
    pub(crate) fn new(
        stack: &str,
        name: &str,
        logical: &str,
        runtime: Runtime,
        handler: &str,
        role: &Role,
        code: PackagedCode,
    ) -> Self {
        let logical = format!("{logical}Function");

        Function {
            name: name.into(),
            function_name: function_name(stack, name),
            handler: handler.into(),
            runtime,
            code,
            role: role.name.clone(),
            arn: Deferred::attribute(&logical, "Arn"),
            logical,
        }
    }

    pub(crate) fn resource(&self, role: &Role, tags: Option<&Tags>) -> CfnResource {
        let mut resource = json!({
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "FunctionName": self.function_name,
                "Handler": self.handler,
                "Runtime": self.runtime.as_str(),
                "Role": role.arn,
                "Code": self.code.to_json(),
                "MemorySize": config().memory_size,
                "Timeout": config().timeout_seconds
            }
        });

        if let Some(tags) = tags {
            resource["Properties"]["Tags"] = tag_list(tags);
        }

        CfnResource {
            name: self.logical.clone(),
            resource,
        }
    }
}
