//! Native browser dialogs (alert, confirm, prompt, beforeunload).
//!
//! Dialogs are delivered through a [`DialogSubscription`]. Callers subscribe
//! before triggering the action that opens the dialog so the event cannot be
//! missed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{E2eError, E2eResult};

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogType {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
    /// Before unload dialog (Leave/Stay buttons)
    BeforeUnload,
}

impl std::fmt::Display for DialogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
            Self::BeforeUnload => write!(f, "beforeunload"),
        }
    }
}

/// Response given to a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    /// Accept (OK/Yes/Leave)
    Accept,
    /// Accept with input text (prompts)
    AcceptWith(String),
    /// Dismiss (Cancel/No/Stay)
    Dismiss,
}

impl DialogAction {
    /// Whether the dialog is accepted
    #[must_use]
    pub const fn accepts(&self) -> bool {
        !matches!(self, Self::Dismiss)
    }

    /// Prompt text sent with the response
    #[must_use]
    pub fn prompt_text(&self) -> Option<&str> {
        match self {
            Self::AcceptWith(text) => Some(text),
            _ => None,
        }
    }
}

/// A dialog opened by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    dialog_type: DialogType,
    message: String,
    default_value: Option<String>,
}

impl Dialog {
    /// Create a new dialog
    #[must_use]
    pub fn new(dialog_type: DialogType, message: impl Into<String>) -> Self {
        Self {
            dialog_type,
            message: message.into(),
            default_value: None,
        }
    }

    /// Create an alert dialog
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogType::Alert, message)
    }

    /// Attach a prompt default
    #[must_use]
    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Get dialog type
    #[must_use]
    pub const fn dialog_type(&self) -> DialogType {
        self.dialog_type
    }

    /// Get dialog message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get default value (for prompts)
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

/// Sending half held by the driver
pub type DialogSender = mpsc::UnboundedSender<Dialog>;

/// Create a connected sender/subscription pair
#[must_use]
pub fn dialog_channel() -> (DialogSender, DialogSubscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, DialogSubscription { rx })
}

/// Stream of dialogs opened after the subscription was created
#[derive(Debug)]
pub struct DialogSubscription {
    rx: mpsc::UnboundedReceiver<Dialog>,
}

impl DialogSubscription {
    /// Wait for the next dialog.
    ///
    /// Fails with `Timeout` when nothing opens within `timeout`, and with
    /// `Dialog` when the page went away.
    pub async fn next(&mut self, timeout: Duration) -> E2eResult<Dialog> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(dialog)) => Ok(dialog),
            Ok(None) => Err(E2eError::Dialog {
                message: "dialog stream closed".to_string(),
            }),
            Err(_) => Err(E2eError::Timeout {
                waiting_for: "native dialog".to_string(),
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Dialog already delivered, if any
    pub fn try_next(&mut self) -> Option<Dialog> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_accepts() {
        assert!(DialogAction::Accept.accepts());
        assert!(DialogAction::AcceptWith("x".into()).accepts());
        assert!(!DialogAction::Dismiss.accepts());
        assert_eq!(DialogAction::AcceptWith("x".into()).prompt_text(), Some("x"));
    }

    #[test]
    fn test_dialog_accessors() {
        let dialog = Dialog::new(DialogType::Prompt, "name?").with_default_value("bob");
        assert_eq!(dialog.dialog_type(), DialogType::Prompt);
        assert_eq!(dialog.message(), "name?");
        assert_eq!(dialog.default_value(), Some("bob"));
        assert_eq!(DialogType::BeforeUnload.to_string(), "beforeunload");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_receives_dialog() {
        let (tx, mut sub) = dialog_channel();
        tx.send(Dialog::alert("Product added.")).unwrap();
        let dialog = sub.next(Duration::from_secs(1)).await.unwrap();
        assert_eq!(dialog.message(), "Product added.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_times_out() {
        let (_tx, mut sub) = dialog_channel();
        let err = sub.next(Duration::from_millis(500)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_closed() {
        let (tx, mut sub) = dialog_channel();
        drop(tx);
        let err = sub.next(Duration::from_millis(500)).await.unwrap_err();
        assert!(matches!(err, E2eError::Dialog { .. }));
    }
}
