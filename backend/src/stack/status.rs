use super::{is_missing, Stack};
use crate::config::config;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::StackEvent;
use common::stack::status::StackStatus;
use eyre::eyre;

const STACK_TYPE: &str = "AWS::CloudFormation::Stack";

/// Reasons CloudFormation gives to resources it stopped because of another failure
const CANCELLED: [&str; 2] = ["Resource creation cancelled", "Resource update cancelled"];

/// The part of a stack event the status is derived from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Event {
    pub logical_id: String,
    pub resource_type: String,
    pub status: String,
    pub reason: Option<String>,
}

impl Event {
    fn is_stack(&self) -> bool {
        self.resource_type == STACK_TYPE
    }

    /// The first event of an operation
    fn is_start(&self) -> bool {
        self.is_stack() && self.reason.as_deref() == Some("User Initiated")
    }
}

impl From<&StackEvent> for Event {
    fn from(event: &StackEvent) -> Self {
        Event {
            logical_id: event.logical_resource_id().unwrap_or_default().into(),
            resource_type: event.resource_type().unwrap_or_default().into(),
            status: event
                .resource_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            reason: event.resource_status_reason().map(String::from),
        }
    }
}

fn is_success(status: &str) -> bool {
    matches!(
        status,
        "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "DELETE_COMPLETE" | "IMPORT_COMPLETE"
    )
}

fn is_failure(status: &str) -> bool {
    matches!(
        status,
        "ROLLBACK_COMPLETE"
            | "ROLLBACK_FAILED"
            | "UPDATE_ROLLBACK_COMPLETE"
            | "UPDATE_ROLLBACK_FAILED"
            | "IMPORT_ROLLBACK_COMPLETE"
            | "IMPORT_ROLLBACK_FAILED"
            | "CREATE_FAILED"
            | "UPDATE_FAILED"
            | "DELETE_FAILED"
    )
}

/// Status of the latest operation
///
/// Events go newest first, the way DescribeStackEvents returns them.
pub fn classify(events: &[Event]) -> StackStatus {
    let end = events
        .iter()
        .position(Event::is_start)
        .map_or(events.len(), |i| i + 1);

    let latest = &events[..end];

    let Some(last) = latest.iter().find(|e| e.is_stack()) else {
        return StackStatus::InProgress;
    };

    if is_success(&last.status) {
        return StackStatus::Complete;
    }

    if !is_failure(&last.status) {
        return StackStatus::InProgress;
    }

    // Oldest first, the root cause is usually the first failure
    let mut errors = latest
        .iter()
        .rev()
        .filter(|e| !e.is_stack() && e.status.ends_with("_FAILED"))
        .filter(|e| !CANCELLED.contains(&e.reason.as_deref().unwrap_or_default()))
        .map(|e| {
            format!(
                "{} {}: {}",
                e.resource_type,
                e.logical_id,
                e.reason.as_deref().unwrap_or("no reason given")
            )
        })
        .collect::<Vec<String>>();

    if errors.is_empty() {
        errors.extend(latest.iter().filter(|e| e.is_stack()).find_map(|e| {
            e.reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(String::from)
        }));
    }

    StackStatus::Failed { errors }
}

impl Stack {
    /// Status of the latest operation run against the stack
    pub async fn status(&self) -> eyre::Result<StackStatus> {
        let mut events: Vec<Event> = vec![];
        let mut next_token = None;

        loop {
            let mut request = self.client.describe_stack_events().stack_name(&self.name);

            if let Some(token) = next_token {
                request = request.next_token(token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if is_missing(&e) => return Ok(StackStatus::Missing),
                Err(e) => return Err(eyre!("Failed to read stack events: {:?}", e.message())),
            };

            events.extend(response.stack_events().iter().map(Event::from));
            next_token = response.next_token().map(String::from);

            // Older pages belong to previous operations
            if next_token.is_none() || events.iter().any(Event::is_start) {
                break;
            }
        }

        Ok(classify(&events))
    }

    /// Poll until the latest operation finishes
    pub async fn wait(&self) -> eyre::Result<StackStatus> {
        loop {
            tokio::time::sleep(config().poll_interval).await;
            let status = self.status().await?;

            if status.is_terminal() {
                return Ok(status);
            }

            log::debug!("Stack {} is {status}", self.name);
        }
    }
}
