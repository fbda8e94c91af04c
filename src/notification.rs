use std::cell::RefCell;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

/// A short message for the user about the outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Receives user-facing notifications; whoever renders the results decides how to show them.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message;
        match notification.kind {
            NotificationKind::Success | NotificationKind::Info => info!("{message}"),
            NotificationKind::Warning => warn!("{message}"),
            NotificationKind::Error => error!("{message}"),
        }
    }
}

/// Keeps notifications in memory, in the order they were sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier(RefCell<Vec<Notification>>);

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        self.0.take()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.0.borrow_mut().push(notification);
    }
}
