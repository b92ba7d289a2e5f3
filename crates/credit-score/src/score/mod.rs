pub mod history;
pub mod inference;
pub mod schema;

use serde::Serialize;

/// Visual weight of a rendered prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Positive,
    Neutral,
    Warning,
}

impl Severity {
    /// "Good" renders as a success state, "Standard" as informational, and
    /// anything else (including "Poor") as a warning.
    pub fn for_label(label: &str) -> Self {
        match label {
            "Good" => Severity::Positive,
            "Standard" => Severity::Neutral,
            _ => Severity::Warning,
        }
    }
}

/// Outcome of one prediction request. Produced and consumed within a single
/// submission cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub severity: Severity,
}
