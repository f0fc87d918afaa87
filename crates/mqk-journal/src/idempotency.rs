use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentOutcome {
    Executed,
    Simulated,
    SkippedDuplicate,
    Failed,
}

impl IntentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentOutcome::Executed => "executed",
            IntentOutcome::Simulated => "simulated",
            IntentOutcome::SkippedDuplicate => "skipped_duplicate",
            IntentOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for IntentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
