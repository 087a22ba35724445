/// Summary of the last operation run against a stack
#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    /// No stack with such name
    Missing,

    InProgress,
    Complete,

    /// The operation failed or was rolled back
    ///
    /// Contains the reasons reported by the failed resources.
    Failed { errors: Vec<String> },
}

impl StackStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StackStatus::InProgress)
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackStatus::Missing => write!(f, "MISSING"),
            StackStatus::InProgress => write!(f, "IN_PROGRESS"),
            StackStatus::Complete => write!(f, "COMPLETE"),
            StackStatus::Failed { .. } => write!(f, "FAILED"),
        }
    }
}
