use base64::Engine;
use serde_json::Value;

/// The event can not be turned into request data
///
/// Every variant reads the same to the caller, the details go to the logs only.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Invalid event data")]
    MissingBody,

    #[error("Invalid event data")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid event data")]
    Malformed(#[from] serde_json::Error),
}

impl EventError {
    /// What exactly went wrong
    pub fn detail(&self) -> String {
        match self {
            EventError::MissingBody => "Missing event body".into(),
            EventError::Encoding(e) => format!("Body is not valid base64: {e}"),
            EventError::Malformed(e) => format!("Body is not valid JSON: {e}"),
        }
    }
}

/// Log the raw event
pub fn log_event(event: &Value) {
    match serde_json::to_string_pretty(event) {
        Ok(json) => tracing::info!("Received event: {json}"),
        Err(e) => tracing::warn!("Received event which can not be printed: {e}"),
    }
}

/// JSON payload carried in the body of an HTTP event
///
/// A missing or empty body is an error, as is a body which is not JSON.
pub fn parse_event_data(event: &Value) -> Result<Value, EventError> {
    let body = event
        .get("body")
        .and_then(Value::as_str)
        .filter(|body| !body.is_empty())
        .ok_or(EventError::MissingBody)?;

    let is_base64 = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if is_base64 {
        let bytes = base64::engine::general_purpose::STANDARD.decode(body)?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    Ok(serde_json::from_str(body)?)
}
