use super::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const HTTP_METHODS: [&str; 8] = [
    "ANY", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT",
];

/// A front door invoking a lambda
///
/// Dispatch is done on the `kind` key, any other value is rejected when the
/// config is parsed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum TriggerSpec {
    #[serde(rename = "http")]
    Http(HttpTrigger),

    #[serde(rename = "pubsub", alias = "sns")]
    PubSub(PubSubTrigger),
}

/// [[lambda.triggers]]
/// kind = "http"
/// path = "/orders"
/// method = "POST"
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct HttpTrigger {
    pub path: Option<String>,
    pub method: Option<String>,
    pub handler: Option<String>,
    pub artifact: Option<PathBuf>,
}

/// [[lambda.triggers]]
/// kind = "pubsub"
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PubSubTrigger {
    /// Physical topic name, generated when omitted
    pub topic_name: Option<String>,
    pub handler: Option<String>,
    pub artifact: Option<PathBuf>,
}

impl TriggerSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerSpec::Http(_) => "http",
            TriggerSpec::PubSub(_) => "pubsub",
        }
    }

    /// Handler reference overriding the lambda's one
    pub fn handler(&self) -> Option<&str> {
        match self {
            TriggerSpec::Http(http) => http.handler.as_deref(),
            TriggerSpec::PubSub(pubsub) => pubsub.handler.as_deref(),
        }
    }

    /// Build artifact overriding the lambda's one
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            TriggerSpec::Http(http) => http.artifact.as_deref(),
            TriggerSpec::PubSub(pubsub) => pubsub.artifact.as_deref(),
        }
    }

    pub(super) fn validate(&self, lambda: &str) -> Result<(), ConfigError> {
        let TriggerSpec::Http(http) = self else {
            return Ok(());
        };

        if let Some(method) = &http.method {
            if !HTTP_METHODS.contains(&method.to_uppercase().as_str()) {
                return Err(ConfigError::InvalidMethod {
                    lambda: lambda.into(),
                    method: method.clone(),
                });
            }
        }

        if let Some(path) = &http.path {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    lambda: lambda.into(),
                    path: path.clone(),
                });
            }
        }

        Ok(())
    }
}

impl HttpTrigger {
    /// API Gateway route key
    ///
    /// The wildcard "$default" route when neither path nor method is set.
    pub fn route_key(&self) -> String {
        if self.path.is_none() && self.method.is_none() {
            return "$default".into();
        }

        format!(
            "{method} {path}",
            method = self
                .method
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or("ANY".into()),
            path = self.path.as_deref().unwrap_or("/{proxy+}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_key_defaults_to_wildcard() {
        assert_eq!(HttpTrigger::default().route_key(), "$default");

        let trigger = HttpTrigger {
            path: Some("/orders".into()),
            method: Some("post".into()),
            ..Default::default()
        };

        assert_eq!(trigger.route_key(), "POST /orders");

        let trigger = HttpTrigger {
            method: Some("GET".into()),
            ..Default::default()
        };

        assert_eq!(trigger.route_key(), "GET /{proxy+}");
    }

    #[test]
    fn rejects_unknown_method_and_relative_path() {
        let trigger = TriggerSpec::Http(HttpTrigger {
            method: Some("FETCH".into()),
            ..Default::default()
        });

        assert!(matches!(
            trigger.validate("orders"),
            Err(ConfigError::InvalidMethod { .. })
        ));

        let trigger = TriggerSpec::Http(HttpTrigger {
            path: Some("orders".into()),
            ..Default::default()
        });

        assert!(matches!(
            trigger.validate("orders"),
            Err(ConfigError::InvalidPath { .. })
        ));
    }
}
