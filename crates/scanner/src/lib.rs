//! Collection Scanner: find a target in a live element collection and act on it
//!
//! Browser end-to-end tests keep doing the same thing in different clothes:
//! pick "India" out of an autocomplete list, click the 15th in a calendar
//! that first has to be paged to the right month, open the product called
//! "Smartphone", find the row for user "Bob". This crate implements that
//! pattern once, over driver traits the browser layer implements.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   ┌────────────┐    ┌────────────┐    ┌──────────────────┐      │
//! │   │ Widgets    │    │ Collection │    │ CandidateSource  │      │
//! │   │ (Dropdown, │───►│ Scanner    │───►│ (browser layer)  │      │
//! │   │ DatePicker)│    │            │    │                  │      │
//! │   └────────────┘    └────────────┘    └──────────────────┘      │
//! │         │                 ▲                                     │
//! │         ▼                 │                                     │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ Session    │───►│ EventBus   │  dialogs, navigation         │
//! │   │ (config)   │    │            │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use collection_scanner::prelude::*;
//!
//! let session = Session::new("checkout", ScannerConfig::load(None)?);
//! let result = session
//!     .scan(&product_titles, "Smartphone", CandidateAction::Click)
//!     .await?;
//! assert_eq!(result.index(), Some(2));
//! ```

#![warn(missing_docs)]

mod action;
mod artifact;
mod config;
mod dialog;
mod driver;
mod event;
mod logging;
mod matcher;
mod result;
mod scanner;
mod session;
mod table;
mod widgets;

pub use action::{ActionOutcome, CandidateAction};
pub use artifact::{sanitize, ArtifactNamer, TIMESTAMP_FORMAT};
pub use config::{ScannerConfig, DEFAULT_EVENT_TIMEOUT_MS, ENV_PREFIX};
pub use dialog::{expect_dialog, Dialog, DialogAction, DialogType};
pub use driver::{
    Candidate, CandidateSource, MockCandidate, MockCollection, MockElement, PagedSource,
};
pub use event::{expect_event, EventBus, EventSubscription, PageEvent, DEFAULT_EVENT_CAPACITY};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use matcher::{MatchMode, TextMatcher};
pub use result::{ScannerError, ScannerResult};
pub use scanner::{
    scan, CollectionScanner, MatchPolicy, MatchedCandidate, ScanOptions, ScanResult, ScanSummary,
    DEFAULT_MAX_ADVANCES, DEFAULT_SCAN_TIMEOUT_MS,
};
pub use session::Session;
pub use table::{parse_csv, CellMismatch, TableComparison};
pub use widgets::{DataTable, DatePicker, Dropdown, ProductCatalog};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        ActionOutcome, Candidate, CandidateAction, CandidateSource, CollectionScanner, DataTable,
        DatePicker, Dialog, DialogAction, DialogType, Dropdown, EventBus, MatchMode, MatchPolicy,
        MockCollection, PageEvent, PagedSource, ProductCatalog, ScanOptions, ScanResult,
        ScannerConfig, ScannerError, ScannerResult, Session,
    };
}
