use std::sync::OnceLock;
use std::time::Duration;

pub(crate) struct Config<'a> {
    /// Managed policy attached to every execution role, rendered through Fn::Sub
    pub(crate) execution_policy_arn: &'a str,

    pub(crate) lambda_principal: &'a str,
    pub(crate) http_principal: &'a str,
    pub(crate) pubsub_principal: &'a str,

    /// API Gateway to Lambda payload format
    pub(crate) http_payload_version: &'a str,

    pub(crate) memory_size: u32,
    pub(crate) timeout_seconds: u32,

    /// Delay between stack status polls
    pub(crate) poll_interval: Duration,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub(crate) fn config() -> &'static Config<'static> {
    CONFIG.get_or_init(|| Config {
        execution_policy_arn: option_env!("LAMBDAFORM_EXECUTION_POLICY_ARN").unwrap_or(
            "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
        ),

        lambda_principal: "lambda.amazonaws.com",
        http_principal: "apigateway.amazonaws.com",
        pubsub_principal: "sns.amazonaws.com",
        http_payload_version: "2.0",

        memory_size: option_env!("LAMBDAFORM_MEMORY_SIZE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(128),

        timeout_seconds: option_env!("LAMBDAFORM_TIMEOUT_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3),

        poll_interval: Duration::from_secs(5),
    })
}
