use crate::event::log_event;
use crate::Response;
use serde_json::{json, Value};

/// Log every message of a topic notification
pub fn handle(event: &Value) -> Response {
    log_event(event);

    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if records.is_empty() {
        tracing::warn!("Event has no records");
    }

    for record in records {
        match record.pointer("/Sns/Message").and_then(Value::as_str) {
            Some(message) => tracing::info!("Message received from SNS: {message}"),
            None => tracing::warn!("Record without a message: {record}"),
        }
    }

    Response::ok(&json!({"message": "Hello from SNS!"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::logs;

    #[test]
    fn logs_every_message() {
        let event = json!({
            "Records": [
                {"EventSource": "aws:sns", "Sns": {"Message": "first order"}},
                {"EventSource": "aws:sns", "Sns": {"Message": "second order"}}
            ]
        });

        let (response, output) = logs(|| handle(&event));

        assert_eq!(response.status_code, 200);
        assert_eq!(response.payload(), json!({"message": "Hello from SNS!"}));
        assert!(output.contains("Message received from SNS: first order"));
        assert!(output.contains("Message received from SNS: second order"));
    }

    #[test]
    fn tolerates_records_without_message() {
        let (response, output) = logs(|| handle(&json!({"Records": [{"Sns": {}}]})));

        assert_eq!(response.status_code, 200);
        assert!(output.contains("Record without a message"));

        let (response, output) = logs(|| handle(&json!({})));
        assert_eq!(response.status_code, 200);
        assert!(output.contains("Event has no records"));
    }
}
