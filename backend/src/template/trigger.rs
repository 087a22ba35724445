use super::{tag_list, tag_map, CfnResource, Function};
use crate::config::config;
use crate::deferred::Deferred;
use common::config::{HttpTrigger, PubSubTrigger, Tags, TriggerSpec};
use serde_json::json;

/// Resources fronting a function for a single trigger
#[derive(Clone, Debug)]
pub enum FrontDoorBinding {
    Http {
        api: String,
        integration: String,
        route: String,
        stage: String,
        permission: String,
        route_key: String,

        /// Logical ID of the invoked function
        function: String,

        endpoint: Deferred,
        source_arn: Deferred,
    },

    PubSub {
        topic: String,
        subscription: String,
        permission: String,

        /// Logical ID of the invoked function
        function: String,

        topic_arn: Deferred,
    },
}

impl FrontDoorBinding {
    /// Logical ID of the invoke permission grant
    pub fn permission(&self) -> &str {
        match self {
            FrontDoorBinding::Http { permission, .. }
            | FrontDoorBinding::PubSub { permission, .. } => permission,
        }
    }

    /// Service allowed to invoke the function
    pub fn principal(&self) -> &'static str {
        match self {
            FrontDoorBinding::Http { .. } => config().http_principal,
            FrontDoorBinding::PubSub { .. } => config().pubsub_principal,
        }
    }

    /// The only source the permission accepts invocations from
    pub fn source_arn(&self) -> &Deferred {
        match self {
            FrontDoorBinding::Http { source_arn, .. } => source_arn,
            FrontDoorBinding::PubSub { topic_arn, .. } => topic_arn,
        }
    }

    pub fn function(&self) -> &str {
        match self {
            FrontDoorBinding::Http { function, .. } | FrontDoorBinding::PubSub { function, .. } => {
                function
            }
        }
    }

    /// The value worth showing after deployment, the URL or the topic ARN
    pub fn address(&self) -> &Deferred {
        match self {
            FrontDoorBinding::Http { endpoint, .. } => endpoint,
            FrontDoorBinding::PubSub { topic_arn, .. } => topic_arn,
        }
    }
}

/// Declare the front door of the trigger and grant it the right to invoke the function
pub(crate) fn wire(
    name: &str,
    trigger: &TriggerSpec,
    function: &Function,
    tags: Option<&Tags>,
) -> (FrontDoorBinding, Vec<CfnResource>) {
    match trigger {
        TriggerSpec::Http(http) => http_api(name, http, function, tags),
        TriggerSpec::PubSub(pubsub) => pubsub_topic(name, pubsub, function, tags),
    }
}

fn permission(
    name: &str,
    function: &Function,
    principal: &str,
    source_arn: &Deferred,
) -> CfnResource {
    CfnResource {
        name: name.into(),
        resource: json!({
            "Type": "AWS::Lambda::Permission",
            "Properties": {
                "Action": "lambda:InvokeFunction",
                "FunctionName": function.arn,
                "Principal": principal,
                "SourceArn": source_arn
            }
        }),
    }
}

/// API -> integration -> route -> stage, plus the permission
fn http_api(
    name: &str,
    http: &HttpTrigger,
    function: &Function,
    tags: Option<&Tags>,
) -> (FrontDoorBinding, Vec<CfnResource>) {
    let api = format!("{name}Api");
    let integration = format!("{name}Integration");
    let route = format!("{name}Route");
    let stage = format!("{name}Stage");
    let permission_name = format!("{name}ApiPermission");
    let route_key = http.route_key();

    let execution_arn = Deferred::sub(
        &format!("{api}ExecutionArn"),
        &format!("arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{api}}}"),
    );

    let source_arn = execution_arn.append(&format!("{api}SourceArn"), "/*/*");

    let mut api_resource = json!({
        "Type": "AWS::ApiGatewayV2::Api",
        "Properties": {
            "Name": function.function_name,
            "ProtocolType": "HTTP"
        }
    });

    let mut stage_resource = json!({
        "Type": "AWS::ApiGatewayV2::Stage",
        "Properties": {
            "ApiId": {"Ref": api},
            "StageName": "$default",
            "AutoDeploy": true
        }
    });

    if let Some(tags) = tags {
        api_resource["Properties"]["Tags"] = tag_map(tags);
        stage_resource["Properties"]["Tags"] = tag_map(tags);
    }

    let resources = vec![
        CfnResource {
            name: api.clone(),
            resource: api_resource,
        },
        CfnResource {
            name: integration.clone(),
            resource: json!({
                "Type": "AWS::ApiGatewayV2::Integration",
                "Properties": {
                    "ApiId": {"Ref": api},
                    "IntegrationType": "AWS_PROXY",
                    "IntegrationUri": function.arn,
                    "PayloadFormatVersion": config().http_payload_version
                }
            }),
        },
        CfnResource {
            name: route.clone(),
            resource: json!({
                "Type": "AWS::ApiGatewayV2::Route",
                "Properties": {
                    "ApiId": {"Ref": api},
                    "RouteKey": route_key,
                    "Target": Deferred::reference(&integration)
                        .prepend(&format!("{route}Target"), "integrations/")
                }
            }),
        },
        CfnResource {
            name: stage.clone(),
            resource: stage_resource,
        },
        permission(
            &permission_name,
            function,
            config().http_principal,
            &source_arn,
        ),
    ];

    let binding = FrontDoorBinding::Http {
        endpoint: Deferred::attribute(&api, "ApiEndpoint"),
        api,
        integration,
        route,
        stage,
        permission: permission_name,
        route_key,
        function: function.logical.clone(),
        source_arn,
    };

    (binding, resources)
}

/// Topic -> subscription, plus the permission
fn pubsub_topic(
    name: &str,
    pubsub: &PubSubTrigger,
    function: &Function,
    tags: Option<&Tags>,
) -> (FrontDoorBinding, Vec<CfnResource>) {
    let topic = format!("{name}Topic");
    let subscription = format!("{name}Subscription");
    let permission_name = format!("{name}TopicPermission");

    // Ref of a topic is its ARN
    let topic_arn = Deferred::reference(&topic);

    let mut topic_resource = json!({
        "Type": "AWS::SNS::Topic",
        "Properties": {}
    });

    if let Some(topic_name) = &pubsub.topic_name {
        topic_resource["Properties"]["TopicName"] = json!(topic_name);
    }

    if let Some(tags) = tags {
        topic_resource["Properties"]["Tags"] = tag_list(tags);
    }

    let resources = vec![
        CfnResource {
            name: topic.clone(),
            resource: topic_resource,
        },
        CfnResource {
            name: subscription.clone(),
            resource: json!({
                "Type": "AWS::SNS::Subscription",
                "Properties": {
                    "TopicArn": topic_arn,
                    "Protocol": "lambda",
                    "Endpoint": function.arn
                }
            }),
        },
        permission(
            &permission_name,
            function,
            config().pubsub_principal,
            &topic_arn,
        ),
    ];

    let binding = FrontDoorBinding::PubSub {
        topic,
        subscription,
        permission: permission_name,
        function: function.logical.clone(),
        topic_arn,
    };

    (binding, resources)
}
