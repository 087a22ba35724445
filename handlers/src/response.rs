use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Lambda proxy response, as API Gateway expects it
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,

    /// JSON encoded payload
    pub body: String,
}

impl Response {
    pub fn json(status_code: u16, body: &Value) -> Self {
        Response {
            status_code,
            headers: BTreeMap::from([("content-type".into(), "application/json".into())]),
            body: body.to_string(),
        }
    }

    pub fn ok(body: &Value) -> Self {
        Self::json(200, body)
    }

    /// 500 with the message in the "error" field
    pub fn error(message: &str) -> Self {
        Self::json(500, &json!({"error": message}))
    }

    /// The body parsed back, for inspection
    pub fn payload(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}
