//! Actions performed on a matched candidate.

use crate::driver::Candidate;
use crate::result::ScannerResult;
use serde::{Deserialize, Serialize};

/// What to do with the first matching candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateAction {
    /// Click the candidate
    Click,
    /// Check the candidate (checkbox, radio)
    Check,
    /// Read the candidate's value
    ReadText,
    /// Locate only
    #[default]
    None,
}

/// Result of performing a [`CandidateAction`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Candidate was clicked
    Clicked,
    /// Candidate was checked; carries the resulting state
    Checked(bool),
    /// Candidate value that was read
    Text(String),
    /// No action was requested
    None,
}

impl CandidateAction {
    /// Action name for logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Check => "check",
            Self::ReadText => "read_text",
            Self::None => "none",
        }
    }

    /// Perform the action on a candidate
    pub async fn perform<C: Candidate>(&self, candidate: &C) -> ScannerResult<ActionOutcome> {
        match self {
            Self::Click => candidate.click().await.map(|()| ActionOutcome::Clicked),
            Self::Check => candidate.check().await.map(ActionOutcome::Checked),
            Self::ReadText => candidate.read().await.map(ActionOutcome::Text),
            Self::None => Ok(ActionOutcome::None),
        }
    }
}

impl std::fmt::Display for CandidateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ActionOutcome {
    /// Text read by a `ReadText` action
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}
