//! Driver seams for the collection scanner.
//!
//! The scanner never talks to a browser directly. The automation layer
//! implements [`CandidateSource`] (and [`PagedSource`] for paged widgets) and
//! hands out [`Candidate`] handles for the elements currently on the page.
//!
//! ```text
//! ┌──────────────────────┐  candidates()   ┌──────────────────────┐
//! │  CollectionScanner   │───────────────►│  CandidateSource      │
//! │                      │  text()/click() │  (browser layer)      │
//! │                      │───────────────►│  Candidate handles    │
//! └──────────────────────┘  advance_page() └──────────────────────┘
//! ```
//!
//! [`MockCollection`] is an in-memory implementation with a call history, used
//! by the unit tests and benches.

use crate::event::{EventBus, PageEvent};
use crate::result::{ScannerError, ScannerResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Handle to one element of a live collection
#[async_trait]
pub trait Candidate: Send + Sync {
    /// Current text value of the element
    async fn text(&self) -> ScannerResult<String>;

    /// Click the element
    async fn click(&self) -> ScannerResult<()>;

    /// Check the element (checkbox, radio) and return the resulting state
    async fn check(&self) -> ScannerResult<bool>;

    /// Read the element's value
    async fn read(&self) -> ScannerResult<String> {
        self.text().await
    }
}

/// Provider of the candidates currently rendered on the page
///
/// Every call must query live state; implementations must not cache.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Candidate handle type
    type Item: Candidate;

    /// Fetch the current candidates in document order
    async fn candidates(&self) -> ScannerResult<Vec<Self::Item>>;
}

/// A candidate source split across pages (calendars, paginated grids)
#[async_trait]
pub trait PagedSource: CandidateSource {
    /// Move to the next page of candidates
    async fn advance_page(&self) -> ScannerResult<()>;
}

// ============================================================================
// Mock implementation
// ============================================================================

/// One element in a [`MockCollection`]
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// Text content as rendered (may carry surrounding whitespace)
    pub text: String,
    /// Number of clicks received
    pub clicks: usize,
    /// Checked state
    pub checked: bool,
    /// Element is detached: every call fails
    pub stale: bool,
    /// Element detaches once its text has been read
    pub detach_after_read: bool,
}

impl MockElement {
    /// Create a new element
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    pages: Vec<Vec<MockElement>>,
    current_page: usize,
    advances: usize,
    fetches: usize,
    latency: Option<Duration>,
    click_events: Vec<(usize, usize, EventBus, PageEvent)>,
    call_history: Vec<String>,
}

impl MockState {
    fn element_mut(&mut self, page: usize, index: usize) -> ScannerResult<&mut MockElement> {
        self.pages
            .get_mut(page)
            .and_then(|elements| elements.get_mut(index))
            .ok_or_else(|| ScannerError::stale(index, "element no longer in collection"))
    }
}

/// In-memory candidate collection for unit testing
///
/// Clones share state, so a test can keep one handle for inspection while the
/// scanner consumes another.
#[derive(Debug, Clone, Default)]
pub struct MockCollection {
    state: Arc<Mutex<MockState>>,
}

impl MockCollection {
    /// Create a single-page collection
    #[must_use]
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::paged(vec![texts.into_iter().map(Into::into).collect()])
    }

    /// Create a paged collection, one `Vec` of texts per page
    #[must_use]
    pub fn paged(pages: Vec<Vec<String>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(MockElement::new).collect())
            .collect();
        Self {
            state: Arc::new(Mutex::new(MockState {
                pages,
                ..MockState::default()
            })),
        }
    }

    /// Delay every text read by `latency`
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Mark an element on the current page as detached
    pub fn mark_stale(&self, index: usize) {
        let mut state = self.lock();
        let page = state.current_page;
        if let Ok(element) = state.element_mut(page, index) {
            element.stale = true;
        }
    }

    /// Detach an element on the current page right after its text is read
    pub fn detach_after_read(&self, index: usize) {
        let mut state = self.lock();
        let page = state.current_page;
        if let Ok(element) = state.element_mut(page, index) {
            element.detach_after_read = true;
        }
    }

    /// Emit `event` on `bus` whenever the element at `index` of the current
    /// page is clicked
    pub fn emit_on_click(&self, index: usize, bus: &EventBus, event: PageEvent) {
        let mut state = self.lock();
        let page = state.current_page;
        state.click_events.push((page, index, bus.clone(), event));
    }

    /// Replace the texts on the current page (simulates a re-render)
    pub fn rerender<I, S>(&self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.lock();
        let page = state.current_page;
        if let Some(elements) = state.pages.get_mut(page) {
            *elements = texts.into_iter().map(MockElement::new).collect();
        }
    }

    /// Snapshot of an element on a given page
    #[must_use]
    pub fn element(&self, page: usize, index: usize) -> Option<MockElement> {
        self.lock()
            .pages
            .get(page)
            .and_then(|elements| elements.get(index))
            .cloned()
    }

    /// Total clicks across every element of every page
    #[must_use]
    pub fn total_clicks(&self) -> usize {
        self.lock().pages.iter().flatten().map(|e| e.clicks).sum()
    }

    /// Number of `advance_page` calls so far
    #[must_use]
    pub fn advances(&self) -> usize {
        self.lock().advances
    }

    /// Number of `candidates` calls so far
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.lock().fetches
    }

    /// Page currently displayed
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.lock().current_page
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(method))
    }
}

/// Candidate handed out by [`MockCollection`]
#[derive(Debug, Clone)]
pub struct MockCandidate {
    state: Arc<Mutex<MockState>>,
    page: usize,
    index: usize,
}

impl MockCandidate {
    /// Position on its page
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Page the candidate was fetched from
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn act<T>(&self, call: &str, f: impl FnOnce(&mut MockElement) -> T) -> ScannerResult<T> {
        let mut state = self.lock();
        state
            .call_history
            .push(format!("{call}:{}:{}", self.page, self.index));
        let element = state.element_mut(self.page, self.index)?;
        if element.stale {
            return Err(ScannerError::stale(self.index, "element is detached"));
        }
        Ok(f(element))
    }
}

#[async_trait]
impl Candidate for MockCandidate {
    async fn text(&self) -> ScannerResult<String> {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.act("text", |element| {
            if element.detach_after_read {
                element.stale = true;
            }
            element.text.clone()
        })
    }

    async fn click(&self) -> ScannerResult<()> {
        self.act("click", |element| element.clicks += 1)?;
        let state = self.lock();
        for (page, index, bus, event) in &state.click_events {
            if *page == self.page && *index == self.index {
                bus.emit(event.clone());
            }
        }
        Ok(())
    }

    async fn check(&self) -> ScannerResult<bool> {
        self.act("check", |element| {
            element.checked = true;
            element.checked
        })
    }
}

#[async_trait]
impl CandidateSource for MockCollection {
    type Item = MockCandidate;

    async fn candidates(&self) -> ScannerResult<Vec<MockCandidate>> {
        let mut state = self.lock();
        state.fetches += 1;
        state.call_history.push("candidates".to_string());
        let page = state.current_page;
        let count = state.pages.get(page).map_or(0, Vec::len);
        Ok((0..count)
            .map(|index| MockCandidate {
                state: Arc::clone(&self.state),
                page,
                index,
            })
            .collect())
    }
}

#[async_trait]
impl PagedSource for MockCollection {
    async fn advance_page(&self) -> ScannerResult<()> {
        let mut state = self.lock();
        state.advances += 1;
        state.current_page += 1;
        state.call_history.push("advance_page".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod mock_collection_tests {
        use super::*;

        #[tokio::test]
        async fn test_candidates_in_order() {
            let collection = MockCollection::new(["a", "b", "c"]);
            let candidates = collection.candidates().await.unwrap();
            assert_eq!(candidates.len(), 3);
            assert_eq!(candidates[1].text().await.unwrap(), "b");
            assert_eq!(candidates[2].index(), 2);
        }

        #[tokio::test]
        async fn test_click_is_recorded() {
            let collection = MockCollection::new(["a", "b"]);
            let candidates = collection.candidates().await.unwrap();
            candidates[1].click().await.unwrap();
            assert_eq!(collection.element(0, 1).unwrap().clicks, 1);
            assert_eq!(collection.total_clicks(), 1);
            assert!(collection.was_called("click:0:1"));
        }

        #[tokio::test]
        async fn test_click_emits_registered_event() {
            let bus = EventBus::default();
            let mut events = bus.subscribe();
            let collection = MockCollection::new(["Delete"]);
            collection.emit_on_click(
                0,
                &bus,
                PageEvent::Console {
                    message: "bye".to_string(),
                },
            );
            collection.candidates().await.unwrap()[0].click().await.unwrap();
            let event = events
                .next_matching("console", |_| true, Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(event.as_str(), "console");
        }

        #[tokio::test]
        async fn test_check_sets_state() {
            let collection = MockCollection::new(["terms"]);
            let candidates = collection.candidates().await.unwrap();
            assert!(candidates[0].check().await.unwrap());
            assert!(collection.element(0, 0).unwrap().checked);
        }

        #[tokio::test]
        async fn test_read_defaults_to_text() {
            let collection = MockCollection::new(["  42 "]);
            let candidates = collection.candidates().await.unwrap();
            assert_eq!(candidates[0].read().await.unwrap(), "  42 ");
        }

        #[tokio::test]
        async fn test_stale_element_fails() {
            let collection = MockCollection::new(["a"]);
            collection.mark_stale(0);
            let candidates = collection.candidates().await.unwrap();
            let err = candidates[0].text().await.unwrap_err();
            assert!(matches!(err, ScannerError::StaleCollection { index: 0, .. }));
        }

        #[tokio::test]
        async fn test_detach_after_read() {
            let collection = MockCollection::new(["a"]);
            collection.detach_after_read(0);
            let candidates = collection.candidates().await.unwrap();
            assert_eq!(candidates[0].text().await.unwrap(), "a");
            assert!(candidates[0].click().await.is_err());
        }

        #[tokio::test]
        async fn test_rerender_invalidates_old_handles() {
            let collection = MockCollection::new(["a", "b", "c"]);
            let old = collection.candidates().await.unwrap();
            collection.rerender(["x"]);
            assert!(old[2].text().await.is_err());
            let fresh = collection.candidates().await.unwrap();
            assert_eq!(fresh.len(), 1);
            assert_eq!(collection.fetches(), 2);
        }
    }

    mod paged_tests {
        use super::*;

        #[tokio::test]
        async fn test_advance_moves_page() {
            let collection = MockCollection::paged(vec![
                vec!["1".to_string()],
                vec!["2".to_string(), "3".to_string()],
            ]);
            collection.advance_page().await.unwrap();
            assert_eq!(collection.current_page(), 1);
            assert_eq!(collection.advances(), 1);
            let candidates = collection.candidates().await.unwrap();
            assert_eq!(candidates.len(), 2);
            assert_eq!(candidates[0].page(), 1);
        }

        #[tokio::test]
        async fn test_advance_past_last_page_is_empty() {
            let collection = MockCollection::new(["only"]);
            collection.advance_page().await.unwrap();
            assert!(collection.candidates().await.unwrap().is_empty());
        }
    }
}
