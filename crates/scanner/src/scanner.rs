//! Collection Scanner: locate a target among a live collection and act on it.
//!
//! A scan pass fetches the current candidates, reads each candidate's text
//! once, and acts on the first one that matches. Nothing is cached between
//! passes because the page may re-render at any time.
//!
//! ```text
//! candidates() ──► [c0, c1, c2, ...]
//!                    │
//!                    ├─ text() ─► trim ─► matches? ── no ──► next
//!                    │                        │
//!                    │                       yes
//!                    │                        ▼
//!                    └──────────────── action.perform() ──► ScanResult
//! ```
//!
//! Paged sources compose the pass with a bounded `advance_page()` loop.

use crate::action::{ActionOutcome, CandidateAction};
use crate::driver::{Candidate, CandidateSource, PagedSource};
use crate::matcher::{MatchMode, TextMatcher};
use crate::result::{ScannerError, ScannerResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Default timeout for a whole scan (5 seconds)
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 5000;

/// Default page-advance budget for paged scans
pub const DEFAULT_MAX_ADVANCES: usize = 12;

/// What happens when a scan finds nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Fail with `NotFound` / `PageBoundExceeded`
    #[default]
    Require,
    /// Return `found = false`
    Optional,
}

impl MatchPolicy {
    /// Policy name as used in configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Require => "require",
            Self::Optional => "optional",
        }
    }
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "require" => Ok(Self::Require),
            "optional" => Ok(Self::Optional),
            other => Err(format!("unknown match policy {other:?}")),
        }
    }
}

/// Options for scan behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// How candidate text is compared
    pub mode: MatchMode,
    /// Behavior when nothing matches
    pub policy: MatchPolicy,
    /// Budget for the whole scan, including page advances
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: MatchMode::Exact,
            policy: MatchPolicy::Require,
            timeout: Duration::from_millis(DEFAULT_SCAN_TIMEOUT_MS),
        }
    }
}

impl ScanOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set match mode
    #[must_use]
    pub const fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set match policy
    #[must_use]
    pub const fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in milliseconds
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// The candidate a scan acted on
#[derive(Debug, Clone)]
pub struct MatchedCandidate<C> {
    /// Candidate handle, valid until the page re-renders
    pub candidate: C,
    /// Position within its pass
    pub index: usize,
    /// Pages advanced before the match (0 for unpaged scans)
    pub page: usize,
    /// Trimmed candidate text
    pub text: String,
    /// Result of the action
    pub outcome: ActionOutcome,
}

/// Outcome of one scan
#[derive(Debug, Clone)]
pub struct ScanResult<C> {
    /// Whether a candidate matched
    pub found: bool,
    /// The matched candidate
    pub matched: Option<MatchedCandidate<C>>,
    /// Candidates whose text was read
    pub scanned: usize,
    /// `advance_page()` calls made
    pub advances: usize,
}

impl<C> ScanResult<C> {
    fn missed(scanned: usize) -> Self {
        Self {
            found: false,
            matched: None,
            scanned,
            advances: 0,
        }
    }

    /// Index of the matched candidate
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.matched.as_ref().map(|m| m.index)
    }

    /// Trimmed text of the matched candidate
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.matched.as_ref().map(|m| m.text.as_str())
    }

    /// Consume the result and return the candidate handle
    #[must_use]
    pub fn into_candidate(self) -> Option<C> {
        self.matched.map(|m| m.candidate)
    }

    /// Handle-free summary, comparable across scans
    #[must_use]
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            found: self.found,
            index: self.index(),
            page: self.matched.as_ref().map(|m| m.page),
            text: self.text().map(str::to_string),
            outcome: self.matched.as_ref().map(|m| m.outcome.clone()),
            scanned: self.scanned,
            advances: self.advances,
        }
    }
}

/// Serializable view of a [`ScanResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Whether a candidate matched
    pub found: bool,
    /// Index of the match within its pass
    pub index: Option<usize>,
    /// Page of the match
    pub page: Option<usize>,
    /// Trimmed text of the match
    pub text: Option<String>,
    /// Action outcome
    pub outcome: Option<ActionOutcome>,
    /// Candidates whose text was read
    pub scanned: usize,
    /// Page advances made
    pub advances: usize,
}

impl ScanSummary {
    /// Export as JSON
    pub fn to_json(&self) -> ScannerResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Scans candidate collections with fixed options
///
/// ## Example
///
/// ```ignore
/// let scanner = CollectionScanner::new(ScanOptions::default());
/// let result = scanner
///     .scan(&product_titles, "Smartphone", CandidateAction::Click)
///     .await?;
/// assert!(result.found);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionScanner {
    options: ScanOptions,
}

impl CollectionScanner {
    /// Create a scanner
    #[must_use]
    pub const fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan the current candidates once and act on the first match
    pub async fn scan<S>(
        &self,
        source: &S,
        target: &str,
        action: CandidateAction,
    ) -> ScannerResult<ScanResult<S::Item>>
    where
        S: CandidateSource,
    {
        let matcher = self.matcher(target)?;
        debug!(wanted = matcher.target(), mode = %self.options.mode, %action, "scan started");

        let result = self
            .bounded(scan_pass(source, &matcher, action, 0))
            .await?;

        if result.found {
            return Ok(result);
        }
        warn!(wanted = matcher.target(), scanned = result.scanned, "no candidate matched");
        match self.options.policy {
            MatchPolicy::Require => Err(ScannerError::NotFound {
                target: matcher.target().to_string(),
            }),
            MatchPolicy::Optional => Ok(result),
        }
    }

    /// Scan page by page, advancing at most `max_advances` times
    pub async fn scan_paged<S>(
        &self,
        source: &S,
        target: &str,
        action: CandidateAction,
        max_advances: usize,
    ) -> ScannerResult<ScanResult<S::Item>>
    where
        S: PagedSource,
    {
        let matcher = self.matcher(target)?;
        debug!(wanted = matcher.target(), max_advances, %action, "paged scan started");

        let result = self
            .bounded(async {
                let mut scanned = 0;
                let mut advances = 0;
                loop {
                    let mut result = scan_pass(source, &matcher, action, advances).await?;
                    scanned += result.scanned;
                    if result.found || advances >= max_advances {
                        result.scanned = scanned;
                        result.advances = advances;
                        return Ok::<_, ScannerError>(result);
                    }
                    trace!(page = advances, "target not on page, advancing");
                    source.advance_page().await?;
                    advances += 1;
                }
            })
            .await?;

        if result.found {
            return Ok(result);
        }
        warn!(wanted = matcher.target(), max_advances, "page budget exhausted");
        match self.options.policy {
            MatchPolicy::Require => Err(ScannerError::PageBoundExceeded {
                target: matcher.target().to_string(),
                max_advances,
            }),
            MatchPolicy::Optional => Ok(result),
        }
    }

    fn matcher(&self, target: &str) -> ScannerResult<TextMatcher> {
        let matcher = TextMatcher::new(target, self.options.mode);
        if matcher.is_valid() {
            Ok(matcher)
        } else {
            Err(ScannerError::InvalidTarget)
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> ScannerResult<T>
    where
        F: Future<Output = ScannerResult<T>>,
    {
        match tokio::time::timeout(self.options.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(ms = self.options.timeout_ms(), "scan timed out");
                Err(ScannerError::Timeout {
                    ms: self.options.timeout_ms(),
                })
            }
        }
    }
}

/// One pass over a freshly fetched collection
async fn scan_pass<S>(
    source: &S,
    matcher: &TextMatcher,
    action: CandidateAction,
    page: usize,
) -> ScannerResult<ScanResult<S::Item>>
where
    S: CandidateSource,
{
    let candidates = source.candidates().await?;
    let mut scanned = 0;

    for (index, candidate) in candidates.into_iter().enumerate() {
        let text = candidate.text().await.map_err(|e| surface_stale(e, index))?;
        scanned += 1;
        trace!(index, text = text.trim(), "candidate read");

        if !matcher.matches(&text) {
            continue;
        }

        let outcome = action
            .perform(&candidate)
            .await
            .map_err(|e| surface_stale(e, index))?;
        info!(index, page, %action, "candidate matched");

        return Ok(ScanResult {
            found: true,
            matched: Some(MatchedCandidate {
                candidate,
                index,
                page,
                text: text.trim().to_string(),
                outcome,
            }),
            scanned,
            advances: 0,
        });
    }

    Ok(ScanResult::missed(scanned))
}

/// Re-index a stale-candidate error to the position in the current pass
pub(crate) fn surface_stale(err: ScannerError, index: usize) -> ScannerError {
    if let ScannerError::StaleCollection { message, .. } = err {
        warn!(index, message = message.as_str(), "candidate went stale mid-scan");
        ScannerError::StaleCollection { index, message }
    } else {
        err
    }
}

/// Scan with default options
pub async fn scan<S>(
    source: &S,
    target: &str,
    action: CandidateAction,
) -> ScannerResult<ScanResult<S::Item>>
where
    S: CandidateSource,
{
    CollectionScanner::default().scan(source, target, action).await
}
