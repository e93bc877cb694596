//! Text matching for scan passes.
//!
//! Both sides are trimmed before comparison. Comparison is case-sensitive.

use serde::{Deserialize, Serialize};

/// How candidate text is compared to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Trimmed text equals the target
    #[default]
    Exact,
    /// Trimmed text contains the target
    Contains,
}

impl MatchMode {
    /// Mode name as used in configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "exact" => Ok(Self::Exact),
            "contains" => Ok(Self::Contains),
            other => Err(format!("unknown match mode {other:?}")),
        }
    }
}

/// A target descriptor bound to a match mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatcher {
    target: String,
    mode: MatchMode,
}

impl TextMatcher {
    /// Create a matcher; the target is trimmed once here
    #[must_use]
    pub fn new(target: &str, mode: MatchMode) -> Self {
        Self {
            target: target.trim().to_string(),
            mode,
        }
    }

    /// Exact-match shorthand
    #[must_use]
    pub fn exact(target: &str) -> Self {
        Self::new(target, MatchMode::Exact)
    }

    /// Contains-match shorthand
    #[must_use]
    pub fn contains(target: &str) -> Self {
        Self::new(target, MatchMode::Contains)
    }

    /// Trimmed target
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Match mode
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether the target is usable (non-empty after trimming)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.target.is_empty()
    }

    /// Compare raw candidate text against the target
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        match self.mode {
            MatchMode::Exact => text == self.target,
            MatchMode::Contains => text.contains(self.target.as_str()),
        }
    }
}
