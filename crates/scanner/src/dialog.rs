//! Browser dialogs (alert, confirm, prompt, beforeunload).
//!
//! Dialogs arrive as [`PageEvent::Dialog`] on the session's event bus.
//! [`expect_dialog`] arms a listener, runs the triggering action, and applies
//! the requested response to the dialog that appeared.

use crate::event::{expect_event, EventBus, PageEvent};
use crate::result::{ScannerError, ScannerResult};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Kind of dialog the page opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogType {
    /// OK button only
    Alert,
    /// OK / Cancel
    Confirm,
    /// Text input with OK / Cancel
    Prompt,
    /// Leave / Stay on unload
    BeforeUnload,
}

impl DialogType {
    /// Name as reported by the browser
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Confirm => "confirm",
            Self::Prompt => "prompt",
            Self::BeforeUnload => "beforeunload",
        }
    }
}

impl std::fmt::Display for DialogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer given to a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAction {
    /// Press OK / Leave
    Accept,
    /// Fill a prompt and press OK
    AcceptWith(String),
    /// Press Cancel / Stay
    Dismiss,
}

/// A dialog observed on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    dialog_type: DialogType,
    message: String,
    response: Option<DialogAction>,
}

impl Dialog {
    /// Unanswered dialog
    #[must_use]
    pub fn new(dialog_type: DialogType, message: impl Into<String>) -> Self {
        Self {
            dialog_type,
            message: message.into(),
            response: None,
        }
    }

    /// Unanswered alert
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogType::Alert, message)
    }

    /// Unanswered confirm
    #[must_use]
    pub fn confirm(message: impl Into<String>) -> Self {
        Self::new(DialogType::Confirm, message)
    }

    /// Unanswered prompt
    #[must_use]
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::new(DialogType::Prompt, message)
    }

    /// Kind of dialog
    #[must_use]
    pub const fn dialog_type(&self) -> DialogType {
        self.dialog_type
    }

    /// Text shown in the dialog
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Answer given, `None` while the dialog is open
    #[must_use]
    pub const fn response(&self) -> Option<&DialogAction> {
        self.response.as_ref()
    }

    fn respond(&mut self, action: DialogAction) {
        self.response = Some(action);
    }
}

/// Run `trigger` and require a dialog of `dialog_type` to open
///
/// The returned dialog carries `response` as its action.
pub async fn expect_dialog<T, F>(
    bus: &EventBus,
    dialog_type: DialogType,
    response: DialogAction,
    timeout: Duration,
    trigger: F,
) -> ScannerResult<(T, Dialog)>
where
    F: Future<Output = ScannerResult<T>>,
{
    let (output, event) = expect_event(
        bus,
        "dialog",
        |event| event.as_dialog().is_some_and(|d| d.dialog_type() == dialog_type),
        timeout,
        trigger,
    )
    .await?;

    let PageEvent::Dialog(mut dialog) = event else {
        return Err(ScannerError::EventNotObserved {
            event: "dialog".to_string(),
            ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        });
    };
    dialog.respond(response);
    info!(kind = %dialog.dialog_type(), message = dialog.message(), "dialog handled");
    Ok((output, dialog))
}
