use crate::event::{log_event, parse_event_data};
use crate::Response;
use serde_json::{json, Value};

/// Echo the JSON body of an HTTP API request
pub fn handle(event: &Value) -> Response {
    log_event(event);

    match parse_event_data(event) {
        Ok(data) => Response::ok(&json!({"message": "Hello from API Gateway!", "data": data})),

        Err(e) => {
            tracing::error!("An error occurred: {}", e.detail());
            Response::error(&e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::logs;

    #[test]
    fn echoes_parsed_body() {
        let response = handle(&json!({"body": "{\"a\":1}"}));

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.payload(),
            json!({"message": "Hello from API Gateway!", "data": {"a": 1}})
        );
    }

    #[test]
    fn empty_event_is_an_error() {
        let (response, output) = logs(|| handle(&json!({})));

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Invalid event data"));
        assert_eq!(response.payload(), json!({"error": "Invalid event data"}));
        assert!(output.contains("Received event"));
        assert!(output.contains("Missing event body"));
    }
}
