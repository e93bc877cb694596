//! Page events and the arm-then-trigger wait.
//!
//! The listener is subscribed before the triggering action starts, and both
//! are awaited together. An event fired synchronously by the trigger can
//! therefore never be missed.

use crate::dialog::Dialog;
use crate::result::{ScannerError, ScannerResult};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

/// Default capacity of the page event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Events raised by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Dialog opened (alert, confirm, prompt)
    Dialog(Dialog),
    /// Frame navigated to a URL
    Navigated {
        /// New URL
        url: String,
    },
    /// Download started
    Download {
        /// Suggested file name
        file_name: String,
    },
    /// Popup window opened
    Popup {
        /// Popup URL
        url: String,
    },
    /// Console message
    Console {
        /// Message text
        message: String,
    },
}

impl PageEvent {
    /// Get the event name string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dialog(_) => "dialog",
            Self::Navigated { .. } => "framenavigated",
            Self::Download { .. } => "download",
            Self::Popup { .. } => "popup",
            Self::Console { .. } => "console",
        }
    }

    /// Dialog payload, if this is a dialog event
    #[must_use]
    pub const fn as_dialog(&self) -> Option<&Dialog> {
        match self {
            Self::Dialog(dialog) => Some(dialog),
            _ => None,
        }
    }
}

impl std::fmt::Display for PageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broadcast channel for page events
///
/// Clones share the same channel. The automation layer calls [`EventBus::emit`];
/// tests and widgets subscribe.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PageEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; returns how many subscribers received it
    pub fn emit(&self, event: PageEvent) -> usize {
        debug!(event = event.as_str(), "page event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Start listening; only events emitted after this call are seen
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// An armed listener on an [`EventBus`]
#[derive(Debug)]
pub struct EventSubscription {
    receiver: broadcast::Receiver<PageEvent>,
}

impl EventSubscription {
    /// Wait for the next `event_name` event accepted by `predicate`
    pub async fn next_matching<P>(
        &mut self,
        event_name: &str,
        predicate: P,
        timeout: Duration,
    ) -> ScannerResult<PageEvent>
    where
        P: Fn(&PageEvent) -> bool,
    {
        self.next_matching_after(event_name, predicate, timeout, std::future::ready(()))
            .await
    }

    /// Like [`next_matching`](Self::next_matching), but the `timeout` only
    /// starts counting once `start` resolves. Events arriving before that are
    /// still accepted.
    pub async fn next_matching_after<P, S>(
        &mut self,
        event_name: &str,
        predicate: P,
        timeout: Duration,
        start: S,
    ) -> ScannerResult<PageEvent>
    where
        P: Fn(&PageEvent) -> bool,
        S: Future,
    {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let not_observed = || ScannerError::EventNotObserved {
            event: event_name.to_string(),
            ms,
        };

        let deadline = async {
            let _ = start.await;
            tokio::time::sleep(timeout).await;
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                received = self.receiver.recv() => match received {
                    Ok(event) if event.as_str() == event_name && predicate(&event) => {
                        return Ok(event);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Err(not_observed()),
                },
                () = &mut deadline => return Err(not_observed()),
            }
        }
    }
}

/// Arm a listener, run `trigger`, and require a matching `event_name` event
///
/// The listener and the trigger are awaited together. `timeout` counts from
/// the moment the trigger resolves, so a slow trigger cannot use up the event
/// budget. Returns the trigger output together with the observed event.
/// Trigger errors take precedence over a missing event.
pub async fn expect_event<T, F, P>(
    bus: &EventBus,
    event_name: &str,
    predicate: P,
    timeout: Duration,
    trigger: F,
) -> ScannerResult<(T, PageEvent)>
where
    F: Future<Output = ScannerResult<T>>,
    P: Fn(&PageEvent) -> bool,
{
    let mut subscription = bus.subscribe();
    let (done_tx, done_rx) = oneshot::channel::<()>();
    let trigger = async move {
        let output = trigger.await;
        // Receiver only goes away once the waiter has finished
        let _ = done_tx.send(());
        output
    };
    let waiter = subscription.next_matching_after(event_name, predicate, timeout, done_rx);
    let (output, event) = tokio::join!(trigger, waiter);
    let output = output?;
    Ok((output, event?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigated(url: &str) -> PageEvent {
        PageEvent::Navigated {
            url: url.to_string(),
        }
    }

    mod bus_tests {
        use super::*;

        #[test]
        fn test_emit_without_subscribers() {
            let bus = EventBus::default();
            assert_eq!(bus.emit(navigated("/")), 0);
        }

        #[test]
        fn test_subscriber_count() {
            let bus = EventBus::default();
            let _a = bus.subscribe();
            let _b = bus.clone().subscribe();
            assert_eq!(bus.subscriber_count(), 2);
        }

        #[test]
        fn test_event_names() {
            assert_eq!(navigated("/").as_str(), "framenavigated");
            assert_eq!(
                PageEvent::Download {
                    file_name: "report.csv".to_string()
                }
                .to_string(),
                "download"
            );
        }
    }

    mod subscription_tests {
        use super::*;

        #[tokio::test]
        async fn test_skips_non_matching() {
            let bus = EventBus::default();
            let mut sub = bus.subscribe();
            bus.emit(PageEvent::Console {
                message: "noise".to_string(),
            });
            bus.emit(navigated("/cart"));
            let event = sub
                .next_matching(
                    "framenavigated",
                    |e| e.as_str() == "framenavigated",
                    Duration::from_secs(1),
                )
                .await
                .unwrap();
            assert_eq!(event, navigated("/cart"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out() {
            let bus = EventBus::default();
            let mut sub = bus.subscribe();
            let err = sub
                .next_matching("download", |_| true, Duration::from_millis(300))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ScannerError::EventNotObserved { ref event, ms: 300 } if event == "download"
            ));
        }
    }

    mod expect_event_tests {
        use super::*;

        #[tokio::test]
        async fn test_event_fired_synchronously_by_trigger_is_seen() {
            let bus = EventBus::default();
            let trigger_bus = bus.clone();
            let (output, event) = expect_event(
                &bus,
                "framenavigated",
                |e| matches!(e, PageEvent::Navigated { .. }),
                Duration::from_secs(1),
                async move {
                    trigger_bus.emit(navigated("/checkout"));
                    Ok(7)
                },
            )
            .await
            .unwrap();
            assert_eq!(output, 7);
            assert_eq!(event, navigated("/checkout"));
        }

        #[tokio::test]
        async fn test_event_emitted_before_arming_is_not_seen() {
            let bus = EventBus::default();
            bus.emit(navigated("/early"));
            let err = expect_event(
                &bus,
                "framenavigated",
                |_| true,
                Duration::from_millis(50),
                async { Ok(()) },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ScannerError::EventNotObserved { .. }));
        }

        #[tokio::test]
        async fn test_other_event_name_is_ignored() {
            let bus = EventBus::default();
            let page = bus.clone();
            let err = expect_event(
                &bus,
                "popup",
                |_| true,
                Duration::from_millis(50),
                async move {
                    page.emit(PageEvent::Download {
                        file_name: "report.csv".to_string(),
                    });
                    Ok(())
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(
                err,
                ScannerError::EventNotObserved { ref event, ms: 50 } if event == "popup"
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_slow_trigger_keeps_event_budget() {
            let bus = EventBus::default();
            let page = bus.clone();
            let (_, event) = expect_event(
                &bus,
                "popup",
                |_| true,
                Duration::from_millis(100),
                async move {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    page.emit(PageEvent::Popup {
                        url: "/help".to_string(),
                    });
                    Ok(())
                },
            )
            .await
            .unwrap();
            assert_eq!(event.as_str(), "popup");
        }

        #[tokio::test(start_paused = true)]
        async fn test_budget_starts_after_trigger() {
            let bus = EventBus::default();
            let page = bus.clone();
            let (_, event) = expect_event(
                &bus,
                "framenavigated",
                |_| true,
                Duration::from_millis(300),
                async move {
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        page.emit(navigated("/late"));
                    });
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    Ok(())
                },
            )
            .await
            .unwrap();
            assert_eq!(event, navigated("/late"));
        }

        #[tokio::test]
        async fn test_trigger_error_wins() {
            let bus = EventBus::default();
            let err = expect_event::<(), _, _>(
                &bus,
                "popup",
                |_| true,
                Duration::from_millis(50),
                async { Err(ScannerError::driver("click intercepted")) },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ScannerError::Driver { .. }));
        }
    }
}
