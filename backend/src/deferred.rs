use serde_json::{json, Value};
use std::collections::HashMap;

/// A value assigned by AWS, unknown until the stack is applied
///
/// Composition only passes these handles around and embeds them into the
/// template as CloudFormation intrinsics. The concrete value can be read only
/// after the apply phase, through the stack outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deferred {
    expr: Expr,

    /// Name of the stack output carrying the resolved value
    key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Expr {
    Ref(String),
    GetAtt(String, String),
    Parameter(String),
    Sub(String),
}

impl Deferred {
    /// Result of Ref on a resource, its ID, name or ARN depending on the type
    pub fn reference(resource: &str) -> Self {
        Deferred {
            expr: Expr::Ref(resource.into()),
            key: format!("{resource}Ref"),
        }
    }

    /// Resource attribute, e.g. a function's Arn
    pub fn attribute(resource: &str, attribute: &str) -> Self {
        Deferred {
            expr: Expr::GetAtt(resource.into(), attribute.into()),
            key: format!("{resource}{attribute}"),
        }
    }

    /// Template parameter filled in by the apply phase
    pub fn parameter(name: &str) -> Self {
        Deferred {
            expr: Expr::Parameter(name.into()),
            key: name.into(),
        }
    }

    /// String interpolation over other values, e.g. "${Api}/*/*"
    pub fn sub(key: &str, template: &str) -> Self {
        Deferred {
            expr: Expr::Sub(template.into()),
            key: key.into(),
        }
    }

    /// The same value followed by a literal suffix
    pub fn append(&self, key: &str, suffix: &str) -> Self {
        Deferred::sub(key, &format!("{}{suffix}", self.placeholder()))
    }

    /// The same value preceded by a literal prefix
    pub fn prepend(&self, key: &str, prefix: &str) -> Self {
        Deferred::sub(key, &format!("{prefix}{}", self.placeholder()))
    }

    /// Name of the stack output the value is exported under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// CloudFormation intrinsic producing the value
    pub fn to_json(&self) -> Value {
        match &self.expr {
            Expr::Ref(name) | Expr::Parameter(name) => json!({"Ref": name}),
            Expr::GetAtt(resource, attribute) => json!({"Fn::GetAtt": [resource, attribute]}),
            Expr::Sub(template) => json!({"Fn::Sub": template}),
        }
    }

    /// Read the value once the stack is applied
    ///
    /// None if the value was not exported or the stack was not applied yet.
    pub fn resolve<'a>(&self, outputs: &'a StackOutputs) -> Option<&'a str> {
        outputs.get(&self.key)
    }

    /// The value as a ${} placeholder inside Fn::Sub
    fn placeholder(&self) -> String {
        match &self.expr {
            Expr::Ref(name) | Expr::Parameter(name) => format!("${{{name}}}"),
            Expr::GetAtt(resource, attribute) => format!("${{{resource}.{attribute}}}"),
            Expr::Sub(template) => template.clone(),
        }
    }
}

impl serde::Serialize for Deferred {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Outputs of an applied stack, by output name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackOutputs(HashMap<String, String>);

impl StackOutputs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outputs sorted by name
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut outputs = self
            .0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<Vec<_>>();

        outputs.sort();
        outputs
    }
}

impl FromIterator<(String, String)> for StackOutputs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        StackOutputs(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_intrinsics() {
        assert_eq!(
            Deferred::reference("OrdersTopic").to_json(),
            json!({"Ref": "OrdersTopic"})
        );

        assert_eq!(
            Deferred::attribute("OrdersFunction", "Arn").to_json(),
            json!({"Fn::GetAtt": ["OrdersFunction", "Arn"]})
        );

        assert_eq!(
            Deferred::parameter("OrdersArtifactKey").to_json(),
            json!({"Ref": "OrdersArtifactKey"})
        );
    }

    #[test]
    fn append_turns_into_sub() {
        let arn = Deferred::sub(
            "OrdersApiExecutionArn",
            "arn:${AWS::Partition}:execute-api:${AWS::Region}:${AWS::AccountId}:${OrdersApi}",
        );

        assert_eq!(
            arn.append("OrdersApiSourceArn", "/*/*").to_json(),
            json!({"Fn::Sub": "arn:${AWS::Partition}:execute-api:${AWS::Region}:${AWS::AccountId}:${OrdersApi}/*/*"})
        );

        assert_eq!(
            Deferred::attribute("OrdersIntegration", "IntegrationId")
                .prepend("OrdersRouteTarget", "integrations/")
                .to_json(),
            json!({"Fn::Sub": "integrations/${OrdersIntegration.IntegrationId}"})
        );
    }

    #[test]
    fn resolves_only_from_outputs() {
        let arn = Deferred::attribute("OrdersFunction", "Arn");
        assert_eq!(arn.resolve(&StackOutputs::default()), None);

        let outputs = StackOutputs::from_iter([(
            "OrdersFunctionArn".to_string(),
            "arn:aws:lambda:us-east-1:123:function:orders".to_string(),
        )]);

        assert_eq!(
            arn.resolve(&outputs),
            Some("arn:aws:lambda:us-east-1:123:function:orders")
        );
    }

    #[test]
    fn serializes_inside_json_macro() {
        let role = Deferred::attribute("OrdersRole", "Arn");

        assert_eq!(
            json!({"Role": role}),
            json!({"Role": {"Fn::GetAtt": ["OrdersRole", "Arn"]}})
        );
    }
}
