//! Result and error types for the collection scanner.

use thiserror::Error;

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Errors that can occur while scanning a collection
#[derive(Debug, Error)]
pub enum ScannerError {
    /// No candidate matched and the caller required a match
    #[error("No candidate matched {target:?}")]
    NotFound {
        /// Target that was searched for
        target: String,
    },

    /// A candidate was invalidated between enumeration and action
    #[error("Candidate {index} went stale during the scan: {message}")]
    StaleCollection {
        /// Position of the candidate in the scan pass
        index: usize,
        /// Driver message
        message: String,
    },

    /// Scan exceeded its allotted time
    #[error("Scan timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Paged scan used up its advance budget without a match
    #[error("Target {target:?} not found after {max_advances} page advances")]
    PageBoundExceeded {
        /// Target that was searched for
        target: String,
        /// Advance budget that was exhausted
        max_advances: usize,
    },

    /// An expected page event never arrived
    #[error("Expected {event} event was not observed within {ms}ms")]
    EventNotObserved {
        /// Event name
        event: String,
        /// Wait budget in milliseconds
        ms: u64,
    },

    /// Target descriptor was empty after trimming
    #[error("Scan target must not be empty")]
    InvalidTarget,

    /// Failure reported by the automation layer
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded or was invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// CSV input could not be parsed
    #[error("CSV error on line {line}: {message}")]
    Csv {
        /// 1-based line number
        line: usize,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScannerError {
    /// Build a stale-candidate error
    #[must_use]
    pub fn stale(index: usize, message: impl Into<String>) -> Self {
        Self::StaleCollection {
            index,
            message: message.into(),
        }
    }

    /// Build a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Whether this error means the target was never located
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::PageBoundExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ScannerError::NotFound {
            target: "Product4".to_string(),
        };
        assert_eq!(err.to_string(), "No candidate matched \"Product4\"");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_page_bound_counts_as_not_found() {
        let err = ScannerError::PageBoundExceeded {
            target: "31".to_string(),
            max_advances: 5,
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("5 page advances"));
    }

    #[test]
    fn test_stale_helper() {
        let err = ScannerError::stale(3, "node detached");
        assert!(matches!(
            err,
            ScannerError::StaleCollection { index: 3, ref message } if message == "node detached"
        ));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ScannerError = io.into();
        assert!(matches!(err, ScannerError::Io(_)));
    }
}
