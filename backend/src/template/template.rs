use super::code;
use super::trigger;
use super::{CfnResource, FrontDoorBinding, Function, PackagedCode, Role};
use crate::deferred::Deferred;
use crate::upload::Upload;
use common::config::{CodeSource, Config, LambdaConfig, Layout, Tags, TriggerSpec};
use common::template::sanitize::{logical_id, stack_name};
use eyre::{eyre, ContextCompat, WrapErr};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// A value exported as a stack output
#[derive(Clone, Debug)]
pub struct Export {
    pub description: String,
    pub value: Deferred,
}

/// The composed deployment: CloudFormation template plus the uploads it depends on
#[derive(Clone, Debug)]
pub struct Template {
    stack_name: String,

    /// Directory the config was read from
    root: PathBuf,

    assets_bucket: Option<String>,

    /// Shared tags, also applied to the stack itself
    tags: Option<Tags>,

    resources: Map<String, Value>,
    functions: Vec<Function>,
    bindings: Vec<FrontDoorBinding>,
    uploads: Vec<Upload>,
    exports: Vec<Export>,
}

/// Distinguish functions of a lambda by trigger kind, numbering the kinds used more than once
fn slugs(triggers: &[TriggerSpec]) -> Vec<String> {
    let mut totals = HashMap::new();

    for trigger in triggers {
        *totals.entry(trigger.kind()).or_insert(0) += 1;
    }

    let mut seen = HashMap::new();

    triggers
        .iter()
        .map(|trigger| {
            let kind = trigger.kind();
            let index = seen.entry(kind).or_insert(0);
            *index += 1;

            if totals[kind] > 1 {
                format!("{kind}-{index}")
            } else {
                kind.to_string()
            }
        })
        .collect()
}

impl Template {
    /// Compose every lambda of the config
    ///
    /// Fails on the first local precondition violation, e.g. a missing build artifact.
    pub fn new(config: &Config) -> eyre::Result<Self> {
        let mut template = Template {
            stack_name: stack_name(&config.stack.name),
            root: config.root.clone(),
            assets_bucket: config.stack.assets_bucket.clone(),
            tags: config.tags.clone(),
            resources: Map::new(),
            functions: vec![],
            bindings: vec![],
            uploads: vec![],
            exports: vec![],
        };

        for lambda in &config.lambdas {
            template
                .lambda(lambda)
                .wrap_err(format!("Failed to compose lambda \"{}\"", lambda.name))?;
        }

        Ok(template)
    }

    /// Add a resource to the CFN template
    fn add_resource(&mut self, CfnResource { name, resource }: CfnResource) -> eyre::Result<()> {
        if self.resources.contains_key(&name) {
            return Err(eyre!("Resource \"{name}\" is declared twice"));
        }

        self.resources.insert(name, resource);
        Ok(())
    }

    /// Export the value as a stack output, so it can be resolved after apply
    fn export(&mut self, description: &str, value: &Deferred) {
        self.exports.push(Export {
            description: description.into(),
            value: value.clone(),
        });
    }

    /// Role, functions and front doors of a single lambda
    fn lambda(&mut self, lambda: &LambdaConfig) -> eyre::Result<()> {
        let tags = lambda.tags_with(self.tags.as_ref());
        let role = Role::new(&logical_id(&[&lambda.name]));
        self.add_resource(role.resource(tags.as_ref()))?;
        let slugs = slugs(&lambda.triggers);

        match lambda.layout {
            Layout::Shared => {
                let base = logical_id(&[&lambda.name]);
                let function =
                    self.function(lambda, &role, &lambda.name, &base, None, tags.as_ref())?;

                for (trigger, slug) in lambda.triggers.iter().zip(&slugs) {
                    let base = logical_id(&[&lambda.name, slug]);
                    self.wire(&base, trigger, &function, tags.as_ref())?;
                }
            }

            Layout::PerTrigger => {
                for (trigger, slug) in lambda.triggers.iter().zip(&slugs) {
                    let name = format!("{}-{slug}", lambda.name);
                    let base = logical_id(&[&lambda.name, slug]);

                    let function = self.function(
                        lambda,
                        &role,
                        &name,
                        &base,
                        Some(trigger),
                        tags.as_ref(),
                    )?;

                    self.wire(&base, trigger, &function, tags.as_ref())?;
                }
            }
        }

        Ok(())
    }

    /// Package the code and declare the function running it
    fn function(
        &mut self,
        lambda: &LambdaConfig,
        role: &Role,
        name: &str,
        base: &str,
        trigger: Option<&TriggerSpec>,
        tags: Option<&Tags>,
    ) -> eyre::Result<Function> {
        let code = self.package(lambda, trigger, tags)?;

        let function = Function::new(
            &self.stack_name,
            name,
            base,
            lambda.runtime,
            lambda.handler_for(trigger),
            role,
            code,
        );

        if let Some(other) = self
            .functions
            .iter()
            .find(|f| f.function_name == function.function_name)
        {
            return Err(eyre!(
                "Functions \"{}\" and \"{name}\" share the name \"{}\"",
                other.name,
                function.function_name
            ));
        }

        self.add_resource(function.resource(role, tags))?;
        self.export(&format!("ARN of function {name}"), &function.arn);
        self.functions.push(function.clone());
        Ok(function)
    }

    fn package(
        &mut self,
        lambda: &LambdaConfig,
        trigger: Option<&TriggerSpec>,
        tags: Option<&Tags>,
    ) -> eyre::Result<PackagedCode> {
        match &lambda.code {
            CodeSource::Inline { path } => {
                let assets_bucket = self
                    .assets_bucket
                    .clone()
                    .wrap_err("Inline code requires [stack] assets_bucket")?;

                code::inline(
                    &lambda.name,
                    &self.root.join(path),
                    &assets_bucket,
                    tags,
                    &mut self.uploads,
                )
            }

            CodeSource::Bucket { bucket, key, .. } => {
                let artifact = lambda
                    .artifact_for(&self.root, trigger)
                    .wrap_err("No artifact for bucket code")?;

                code::object(
                    &lambda.name,
                    &artifact,
                    bucket,
                    key.as_deref(),
                    tags,
                    &mut self.uploads,
                )
            }
        }
    }

    fn wire(
        &mut self,
        base: &str,
        trigger: &TriggerSpec,
        function: &Function,
        tags: Option<&Tags>,
    ) -> eyre::Result<()> {
        let (binding, resources) = trigger::wire(base, trigger, function, tags);

        for resource in resources {
            self.add_resource(resource)?;
        }

        let description = match &binding {
            FrontDoorBinding::Http { route_key, .. } => {
                format!("Endpoint of {} ({route_key})", function.name)
            }
            FrontDoorBinding::PubSub { .. } => format!("Topic of {}", function.name),
        };

        self.export(&description, binding.address());
        self.bindings.push(binding);
        Ok(())
    }

    /// Template parameters receiving the object keys of uploads
    fn parameters(&self) -> Map<String, Value> {
        self.uploads
            .iter()
            .map(|upload| {
                (
                    upload.parameter(),
                    json!({
                        "Type": "String",
                        "Description": format!("Object key of {} in {}", upload.name, upload.bucket.name())
                    }),
                )
            })
            .collect()
    }

    fn outputs(&self) -> Map<String, Value> {
        self.exports
            .iter()
            .map(|export| {
                (
                    export.value.key().to_string(),
                    json!({"Description": export.description, "Value": export.value}),
                )
            })
            .collect()
    }

    /// The full CFN template
    pub fn to_json(&self) -> Value {
        let mut template = json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Description": format!("Lambda deployment {}", self.stack_name),
            "Resources": self.resources,
        });

        let parameters = self.parameters();

        if !parameters.is_empty() {
            template["Parameters"] = Value::Object(parameters);
        }

        let outputs = self.outputs();

        if !outputs.is_empty() {
            template["Outputs"] = Value::Object(outputs);
        }

        template
    }

    /// Template body as sent to CloudFormation
    pub fn body(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(&self.to_json()).wrap_err("Failed to serialize the template")
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn bindings(&self) -> &[FrontDoorBinding] {
        &self.bindings
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    pub fn resources(&self) -> &Map<String, Value> {
        &self.resources
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [stack]
        name = "shop"
        assets_bucket = "shop-assets"

        [tags]
        Environment = "dev"
        Project = "my-pulumi-project"

        [[lambda]]
        name = "orders"
        runtime = "nodejs20.x"
        code = { source = "bucket", bucket = { create = "shop-builds" } }

        [[lambda.triggers]]
        kind = "http"
        handler = "apiHandler.handler"

        [[lambda.triggers]]
        kind = "sns"
        handler = "snsHandler.handler"
    "#;

    fn project(config: &str, files: &[&str]) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();

        for file in files {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"code").unwrap();
        }

        let config = Config::parse(config, dir.path().to_path_buf()).unwrap();
        (dir, config)
    }

    fn of_type<'a>(template: &'a Template, kind: &str) -> Vec<&'a Value> {
        template
            .resources()
            .values()
            .filter(|r| r["Type"] == kind)
            .collect()
    }

    #[test]
    fn a_permission_per_trigger() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip", "dist/snsHandler.zip"]);
        let template = Template::new(&config).unwrap();
        let resources = template.resources();

        assert_eq!(of_type(&template, "AWS::Lambda::Permission").len(), 2);
        assert_eq!(template.bindings().len(), 2);

        for binding in template.bindings() {
            let permission = &resources[binding.permission()]["Properties"];

            assert_eq!(permission["Principal"], binding.principal());
            assert_eq!(permission["SourceArn"], json!(binding.source_arn()));
            assert_eq!(
                permission["FunctionName"],
                json!({"Fn::GetAtt": [binding.function(), "Arn"]})
            );
        }

        let api = &resources["OrdersHttpApiPermission"]["Properties"];
        assert_eq!(api["Principal"], "apigateway.amazonaws.com");
        assert_eq!(
            api["SourceArn"],
            json!({"Fn::Sub": "arn:${AWS::Partition}:execute-api:${AWS::Region}:${AWS::AccountId}:${OrdersHttpApi}/*/*"})
        );

        let topic = &resources["OrdersPubsubTopicPermission"]["Properties"];
        assert_eq!(topic["Principal"], "sns.amazonaws.com");
        assert_eq!(topic["SourceArn"], json!({"Ref": "OrdersPubsubTopic"}));
    }

    #[test]
    fn missing_artifact_fails_composition() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip"]);
        let error = Template::new(&config).unwrap_err();

        assert!(format!("{error:?}").contains("snsHandler.zip, build first"));
    }

    #[test]
    fn every_function_has_one_code_source() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip", "dist/snsHandler.zip"]);
        let template = Template::new(&config).unwrap();
        let functions = of_type(&template, "AWS::Lambda::Function");

        assert_eq!(functions.len(), 2);

        for function in functions {
            let code = function["Properties"]["Code"].as_object().unwrap();
            assert_eq!(code.len(), 2);
            assert_eq!(code["S3Bucket"], "shop-builds");
            assert!(code["S3Key"]["Ref"].is_string());
            assert!(!code.contains_key("ZipFile"));
        }

        assert_eq!(template.uploads().len(), 2);

        let parameters = template.to_json()["Parameters"].as_object().unwrap().clone();
        assert!(parameters.contains_key("OrdersApiHandlerArtifactKey"));
        assert!(parameters.contains_key("OrdersSnsHandlerArtifactKey"));
    }

    #[test]
    fn one_role_per_lambda() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip", "dist/snsHandler.zip"]);
        let template = Template::new(&config).unwrap();

        assert_eq!(of_type(&template, "AWS::IAM::Role").len(), 1);

        for function in template.functions() {
            assert_eq!(function.role, "OrdersRole");
            assert_eq!(
                template.resources()[&function.logical]["Properties"]["Role"],
                json!({"Fn::GetAtt": ["OrdersRole", "Arn"]})
            );
        }

        let role = &template.resources()["OrdersRole"]["Properties"];
        assert_eq!(
            role["ManagedPolicyArns"],
            json!([{"Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"}])
        );
        assert_eq!(
            role["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            json!(["lambda.amazonaws.com"])
        );
        assert_eq!(
            role["Tags"],
            json!([
                {"Key": "Environment", "Value": "dev"},
                {"Key": "Project", "Value": "my-pulumi-project"}
            ])
        );
    }

    #[test]
    fn http_front_door_shape() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip", "dist/snsHandler.zip"]);
        let template = Template::new(&config).unwrap();
        let resources = template.resources();

        assert_eq!(resources["OrdersHttpApi"]["Properties"]["ProtocolType"], "HTTP");
        assert_eq!(
            resources["OrdersHttpApi"]["Properties"]["Tags"],
            json!({"Environment": "dev", "Project": "my-pulumi-project"})
        );

        let integration = &resources["OrdersHttpIntegration"]["Properties"];
        assert_eq!(integration["IntegrationType"], "AWS_PROXY");
        assert_eq!(integration["PayloadFormatVersion"], "2.0");
        assert_eq!(
            integration["IntegrationUri"],
            json!({"Fn::GetAtt": ["OrdersHttpFunction", "Arn"]})
        );

        let route = &resources["OrdersHttpRoute"]["Properties"];
        assert_eq!(route["RouteKey"], "$default");
        assert_eq!(
            route["Target"],
            json!({"Fn::Sub": "integrations/${OrdersHttpIntegration}"})
        );

        let stage = &resources["OrdersHttpStage"]["Properties"];
        assert_eq!(stage["StageName"], "$default");
        assert_eq!(stage["AutoDeploy"], true);

        let function = &resources["OrdersHttpFunction"]["Properties"];
        assert_eq!(function["FunctionName"], "shop-orders-http");
        assert_eq!(function["Handler"], "apiHandler.handler");
        assert_eq!(function["Runtime"], "nodejs20.x");
    }

    #[test]
    fn pubsub_front_door_shape() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip", "dist/snsHandler.zip"]);
        let template = Template::new(&config).unwrap();
        let subscription = &template.resources()["OrdersPubsubSubscription"]["Properties"];

        assert_eq!(subscription["Protocol"], "lambda");
        assert_eq!(subscription["TopicArn"], json!({"Ref": "OrdersPubsubTopic"}));
        assert_eq!(
            subscription["Endpoint"],
            json!({"Fn::GetAtt": ["OrdersPubsubFunction", "Arn"]})
        );
    }

    #[test]
    fn shared_layout_declares_one_function() {
        let config = r#"
            [stack]
            name = "shop"

            [[lambda]]
            name = "orders"
            runtime = "nodejs20.x"
            layout = "shared"
            code = { source = "bucket", bucket = { existing = "shop-builds" }, key = "orders.zip" }

            [[lambda.triggers]]
            kind = "http"
            path = "/orders"
            method = "POST"

            [[lambda.triggers]]
            kind = "http"

            [[lambda.triggers]]
            kind = "pubsub"
            topic_name = "orders"
        "#;

        let (_dir, config) = project(config, &["dist/index.zip"]);
        let template = Template::new(&config).unwrap();

        assert_eq!(template.functions().len(), 1);
        assert_eq!(of_type(&template, "AWS::Lambda::Function").len(), 1);
        assert_eq!(of_type(&template, "AWS::Lambda::Permission").len(), 3);
        assert_eq!(template.uploads().len(), 1);

        for binding in template.bindings() {
            assert_eq!(binding.function(), "OrdersFunction");
        }

        let resources = template.resources();
        assert_eq!(resources["OrdersHttp1Route"]["Properties"]["RouteKey"], "POST /orders");
        assert_eq!(resources["OrdersHttp2Route"]["Properties"]["RouteKey"], "$default");
        assert_eq!(resources["OrdersPubsubTopic"]["Properties"]["TopicName"], "orders");
        assert!(resources["OrdersPubsubTopic"]["Properties"].get("Tags").is_none());
    }

    #[test]
    fn per_trigger_layout_numbers_repeated_kinds() {
        let config = r#"
            [[lambda]]
            name = "orders"
            runtime = "python3.12"
            handler = "main.handler"
            code = { source = "bucket", bucket = { existing = "shop-builds" } }

            [[lambda.triggers]]
            kind = "pubsub"

            [[lambda.triggers]]
            kind = "pubsub"
        "#;

        let (dir, config) = project(config, &["dist/main.zip"]);
        let template = Template::new(&config).unwrap();

        let names = template
            .functions()
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["orders-pubsub-1", "orders-pubsub-2"]);

        // Both functions run the same artifact, uploaded once
        assert_eq!(template.uploads().len(), 1);

        let stack = dir
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap();

        assert_eq!(template.stack_name(), stack_name(&stack));
    }

    #[test]
    fn inline_code_is_staged() {
        let config = r#"
            [stack]
            name = "shop"
            assets_bucket = "shop-assets"

            [[lambda]]
            name = "notify"
            runtime = "nodejs20.x"
            code = { source = "inline", path = "handlers" }

            [[lambda.triggers]]
            kind = "http"

            [[lambda.triggers]]
            kind = "sns"
        "#;

        let (_dir, config) = project(config, &["handlers/index.js"]);
        let template = Template::new(&config).unwrap();

        assert_eq!(template.functions().len(), 2);
        assert!(template.functions().iter().all(|f| f.code.is_archive()));
        assert_eq!(template.uploads().len(), 1);
        assert_eq!(template.uploads()[0].bucket.name(), "shop-assets");
    }

    #[test]
    fn exports_function_arns_and_front_doors() {
        let (_dir, config) = project(CONFIG, &["dist/apiHandler.zip", "dist/snsHandler.zip"]);
        let template = Template::new(&config).unwrap();
        let outputs = template.to_json()["Outputs"].clone();

        assert_eq!(template.exports().len(), 4);

        assert_eq!(
            outputs["OrdersHttpApiApiEndpoint"]["Value"],
            json!({"Fn::GetAtt": ["OrdersHttpApi", "ApiEndpoint"]})
        );

        assert_eq!(
            outputs["OrdersPubsubFunctionArn"]["Value"],
            json!({"Fn::GetAtt": ["OrdersPubsubFunction", "Arn"]})
        );

        assert_eq!(
            outputs["OrdersPubsubTopicRef"]["Value"],
            json!({"Ref": "OrdersPubsubTopic"})
        );
    }

    #[test]
    fn colliding_logical_ids_are_rejected() {
        let config = r#"
            [stack]
            name = "shop"

            [[lambda]]
            name = "orders"
            runtime = "nodejs20.x"
            code = { source = "bucket", bucket = { existing = "shop-builds" } }

            [[lambda.triggers]]
            kind = "http"

            [[lambda]]
            name = "orders-http"
            runtime = "nodejs20.x"
            layout = "shared"
            code = { source = "bucket", bucket = { existing = "shop-builds" } }

            [[lambda.triggers]]
            kind = "pubsub"
        "#;

        let (_dir, config) = project(config, &["dist/index.zip"]);
        let error = Template::new(&config).unwrap_err();

        assert!(format!("{error:?}").contains("\"OrdersHttpFunction\" is declared twice"));
    }

    #[test]
    fn same_stem_artifacts_get_own_parameters() {
        let config = r#"
            [stack]
            name = "shop"

            [[lambda]]
            name = "orders"
            runtime = "nodejs20.x"
            handler = "index.handler"
            code = { source = "bucket", bucket = { existing = "shop-builds" } }

            [[lambda.triggers]]
            kind = "http"
            artifact = "a/index.zip"

            [[lambda.triggers]]
            kind = "sns"
            artifact = "b/index.zip"
        "#;

        let (_dir, config) = project(config, &["a/index.zip", "b/index.zip"]);
        let template = Template::new(&config).unwrap();

        assert_eq!(template.uploads().len(), 2);

        let parameters = template.to_json()["Parameters"].as_object().unwrap().clone();
        assert_eq!(parameters.len(), 2);
        assert!(parameters.contains_key("OrdersIndexArtifactKey"));
        assert!(parameters.contains_key("OrdersIndex2ArtifactKey"));

        let resources = template.resources();
        assert_eq!(
            resources["OrdersHttpFunction"]["Properties"]["Code"]["S3Key"],
            json!({"Ref": "OrdersIndexArtifactKey"})
        );
        assert_eq!(
            resources["OrdersPubsubFunction"]["Properties"]["Code"]["S3Key"],
            json!({"Ref": "OrdersIndex2ArtifactKey"})
        );
    }

    #[test]
    fn truncated_function_names_must_differ() {
        let config = format!(
            r#"
            [stack]
            name = "{}"

            [[lambda]]
            name = "orders"
            runtime = "nodejs20.x"
            code = {{ source = "bucket", bucket = {{ existing = "shop-builds" }} }}

            [[lambda.triggers]]
            kind = "http"

            [[lambda]]
            name = "orderz"
            runtime = "nodejs20.x"
            code = {{ source = "bucket", bucket = {{ existing = "shop-builds" }} }}

            [[lambda.triggers]]
            kind = "http"
        "#,
            "s".repeat(60)
        );

        let (_dir, config) = project(&config, &["dist/index.zip"]);
        let error = Template::new(&config).unwrap_err();

        assert!(format!("{error:?}").contains("Functions \"orders-http\" and \"orderz-http\" share the name"));
    }
}
