//! Page objects for the widgets the scanner is used on.
//!
//! Each widget wraps one or more [`CandidateSource`]s supplied by the browser
//! layer and takes the [`Session`] explicitly on every call.

use crate::action::CandidateAction;
use crate::driver::{Candidate, CandidateSource, PagedSource};
use crate::matcher::{MatchMode, TextMatcher};
use crate::result::{ScannerError, ScannerResult};
use crate::scanner::{surface_stale, MatchPolicy};
use crate::session::Session;
use crate::table::TableComparison;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use tracing::debug;

/// Dropdown / autocomplete option list
#[derive(Debug, Clone)]
pub struct Dropdown<S> {
    options: S,
}

impl<S: CandidateSource> Dropdown<S> {
    /// Wrap the option source
    #[must_use]
    pub const fn new(options: S) -> Self {
        Self { options }
    }

    /// Click the option whose label is exactly `label`
    pub async fn select(&self, session: &Session, label: &str) -> ScannerResult<usize> {
        let result = session
            .scanner_with(MatchMode::Exact, MatchPolicy::Require)
            .scan(&self.options, label, CandidateAction::Click)
            .await?;
        Ok(result.index().unwrap_or_default())
    }

    /// Whether an option labelled `label` is currently offered
    pub async fn has_option(&self, session: &Session, label: &str) -> ScannerResult<bool> {
        let result = session
            .scanner_with(MatchMode::Exact, MatchPolicy::Optional)
            .scan(&self.options, label, CandidateAction::None)
            .await?;
        Ok(result.found)
    }
}

/// Calendar date picker
///
/// `months` yields the month header of the page currently shown and advances
/// to the next month; `days` yields the day cells of the month on screen.
#[derive(Debug, Clone)]
pub struct DatePicker<M, D> {
    months: M,
    days: D,
}

impl<M: PagedSource, D: CandidateSource> DatePicker<M, D> {
    /// Wrap the header and day sources
    #[must_use]
    pub const fn new(months: M, days: D) -> Self {
        Self { months, days }
    }

    /// Navigate to `month` (e.g. "March 2025") and click `day`
    ///
    /// Both steps share one scan budget. Returns the number of months advanced.
    pub async fn pick(&self, session: &Session, month: &str, day: u32) -> ScannerResult<usize> {
        within_budget(session, async {
            let navigated = session
                .scanner_with(MatchMode::Exact, MatchPolicy::Require)
                .scan_paged(
                    &self.months,
                    month,
                    CandidateAction::None,
                    session.config().max_advances,
                )
                .await?;
            debug!(month, advances = navigated.advances, "month reached");

            session
                .scanner_with(MatchMode::Exact, MatchPolicy::Require)
                .scan(&self.days, &day.to_string(), CandidateAction::Click)
                .await?;
            Ok::<_, ScannerError>(navigated.advances)
        })
        .await
    }
}

/// Product grid with clickable titles
#[derive(Debug, Clone)]
pub struct ProductCatalog<S> {
    titles: S,
}

impl<S: CandidateSource> ProductCatalog<S> {
    /// Wrap the product title source
    #[must_use]
    pub const fn new(titles: S) -> Self {
        Self { titles }
    }

    /// Open the product called `name`
    pub async fn open(&self, session: &Session, name: &str) -> ScannerResult<()> {
        session
            .scan(&self.titles, name, CandidateAction::Click)
            .await
            .map(|_| ())
    }

    /// Whether `name` is listed
    pub async fn lists(&self, session: &Session, name: &str) -> ScannerResult<bool> {
        let result = session
            .scanner_with(MatchMode::Exact, MatchPolicy::Optional)
            .scan(&self.titles, name, CandidateAction::None)
            .await?;
        Ok(result.found)
    }
}

/// Data table
///
/// `keys` yields one key cell per row; `rows` yields the full rows, with
/// cells joined by `separator` in their text.
#[derive(Debug, Clone)]
pub struct DataTable<K, R> {
    keys: K,
    rows: R,
    separator: char,
}

impl<K: CandidateSource, R: CandidateSource> DataTable<K, R> {
    /// Wrap key and row sources; cells are tab-separated
    #[must_use]
    pub const fn new(keys: K, rows: R) -> Self {
        Self {
            keys,
            rows,
            separator: '\t',
        }
    }

    /// Set the cell separator used in row text
    #[must_use]
    pub const fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Text of the row whose key cell is exactly `key`
    pub async fn find_row(&self, session: &Session, key: &str) -> ScannerResult<String> {
        let located = session
            .scanner_with(MatchMode::Exact, MatchPolicy::Require)
            .scan(&self.keys, key, CandidateAction::None)
            .await?;
        let index = located.index().unwrap_or_default();

        let rows = self.rows.candidates().await?;
        let row = rows
            .get(index)
            .ok_or_else(|| ScannerError::stale(index, "row disappeared after key lookup"))?;
        Ok(row.read().await?.trim().to_string())
    }

    /// Texts of every row containing `fragment`
    pub async fn filter_rows(
        &self,
        session: &Session,
        fragment: &str,
    ) -> ScannerResult<Vec<String>> {
        let matcher = TextMatcher::contains(fragment);
        if !matcher.is_valid() {
            return Err(ScannerError::InvalidTarget);
        }
        let texts = self.row_texts(session).await?;
        Ok(texts.into_iter().filter(|t| matcher.matches(t)).collect())
    }

    /// Rows split into trimmed cells
    pub async fn cells(&self, session: &Session) -> ScannerResult<Vec<Vec<String>>> {
        let separator = self.separator;
        let texts = self.row_texts(session).await?;
        Ok(texts
            .iter()
            .map(|row| row.split(separator).map(|c| c.trim().to_string()).collect())
            .collect())
    }

    /// Compare the rendered table against CSV text
    pub async fn compare_csv(
        &self,
        session: &Session,
        csv: &str,
    ) -> ScannerResult<TableComparison> {
        let cells = self.cells(session).await?;
        TableComparison::compare(&cells, csv)
    }

    async fn row_texts(&self, session: &Session) -> ScannerResult<Vec<String>> {
        within_budget(session, async {
            let rows = self.rows.candidates().await?;
            stream::iter(rows.iter().enumerate())
                .then(|(index, row)| async move {
                    row.text().await.map_err(|e| surface_stale(e, index))
                })
                .try_collect::<Vec<String>>()
                .await
        })
        .await
    }
}

/// Run `fut` under the session's scan timeout
async fn within_budget<T, F>(session: &Session, fut: F) -> ScannerResult<T>
where
    F: Future<Output = ScannerResult<T>>,
{
    let options = session.config().scan_options();
    tokio::time::timeout(options.timeout, fut)
        .await
        .unwrap_or_else(|_| {
            Err(ScannerError::Timeout {
                ms: options.timeout_ms(),
            })
        })
}
