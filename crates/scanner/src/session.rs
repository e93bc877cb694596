//! Explicit test session context.
//!
//! A [`Session`] carries everything a scan needs besides the collection: the
//! configuration and the page event bus. Tests create one per browser page and
//! pass it to every step.

use crate::action::CandidateAction;
use crate::artifact::ArtifactNamer;
use crate::config::ScannerConfig;
use crate::dialog::{expect_dialog, Dialog, DialogAction, DialogType};
use crate::driver::{CandidateSource, PagedSource};
use crate::event::EventBus;
use crate::matcher::MatchMode;
use crate::result::ScannerResult;
use crate::scanner::{CollectionScanner, MatchPolicy, ScanResult};
use std::future::Future;
use tracing::info_span;
use tracing::Instrument;

/// Per-page context passed into scans
#[derive(Debug, Clone, Default)]
pub struct Session {
    name: String,
    config: ScannerConfig,
    events: EventBus,
}

impl Session {
    /// Create a session with the given configuration
    #[must_use]
    pub fn new(name: impl Into<String>, config: ScannerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            events: EventBus::default(),
        }
    }

    /// Share an existing event bus (e.g. one fed by the browser layer)
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Session name, used in log spans
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Page event bus
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Scanner using the configured defaults
    #[must_use]
    pub fn scanner(&self) -> CollectionScanner {
        CollectionScanner::new(self.config.scan_options())
    }

    /// Scanner with a different match mode and policy
    #[must_use]
    pub fn scanner_with(&self, mode: MatchMode, policy: MatchPolicy) -> CollectionScanner {
        CollectionScanner::new(
            self.config
                .scan_options()
                .with_mode(mode)
                .with_policy(policy),
        )
    }

    /// Artifact namer rooted at the configured directory
    #[must_use]
    pub fn artifacts(&self) -> ArtifactNamer {
        ArtifactNamer::new(&self.config.artifact_dir)
    }

    /// Single-pass scan with the session defaults
    pub async fn scan<S>(
        &self,
        source: &S,
        target: &str,
        action: CandidateAction,
    ) -> ScannerResult<ScanResult<S::Item>>
    where
        S: CandidateSource,
    {
        self.scanner()
            .scan(source, target, action)
            .instrument(info_span!("scan", session = %self.name))
            .await
    }

    /// Paged scan bounded by the configured `max_advances`
    pub async fn scan_paged<S>(
        &self,
        source: &S,
        target: &str,
        action: CandidateAction,
    ) -> ScannerResult<ScanResult<S::Item>>
    where
        S: PagedSource,
    {
        self.scanner()
            .scan_paged(source, target, action, self.config.max_advances)
            .instrument(info_span!("scan_paged", session = %self.name))
            .await
    }

    /// Run `trigger` and require a dialog of `dialog_type`, answered with `response`
    pub async fn expect_dialog<T, F>(
        &self,
        dialog_type: DialogType,
        response: DialogAction,
        trigger: F,
    ) -> ScannerResult<(T, Dialog)>
    where
        F: Future<Output = ScannerResult<T>>,
    {
        expect_dialog(
            &self.events,
            dialog_type,
            response,
            self.config.event_timeout(),
            trigger,
        )
        .await
    }
}
