use super::{tag_list, CfnResource};
use crate::config::config;
use crate::deferred::Deferred;
use common::config::Tags;
use serde_json::{json, Value};

/// Execution identity shared by all the functions of a lambda
#[derive(Clone, Debug)]
pub struct Role {
    /// Logical ID in the template
    pub name: String,

    /// Allows the Lambda service to assume the role
    pub trust_policy: Value,

    /// Managed policy attached to the role, may reference ${AWS::Partition}
    pub policy_arn: String,

    pub arn: Deferred,
}

impl Role {
    pub(crate) fn new(name: &str) -> Self {
        let name = format!("{name}Role");

        Role {
            trust_policy: json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"Service": [config().lambda_principal]},
                    "Action": ["sts:AssumeRole"]
                }]
            }),
            policy_arn: config().execution_policy_arn.into(),
            arn: Deferred::attribute(&name, "Arn"),
            name,
        }
    }

    /// The role with the managed policy attached
    pub(crate) fn resource(&self, tags: Option<&Tags>) -> CfnResource {
        let mut resource = json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "AssumeRolePolicyDocument": self.trust_policy,
                "Path": "/",
                "ManagedPolicyArns": [{"Fn::Sub": self.policy_arn}]
            }
        });

        if let Some(tags) = tags {
            resource["Properties"]["Tags"] = tag_list(tags);
        }

        CfnResource {
            name: self.name.clone(),
            resource,
        }
    }
}
