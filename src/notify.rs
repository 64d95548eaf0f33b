//! Downstream notification boundary
//!
//! The UI displays transient toasts and an optional global loading
//! indicator; this module owns the trait the coordinator talks to. The
//! toast auto-dismiss interval is fixed by configuration
//! ([`crate::config::NotificationsConfig::dismiss_seconds`], 3 s by
//! default).

/// Success/error flag accompanying every message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Notification display API implemented by the UI layer
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show a transient message, dismissed after the configured interval
    fn notify(&self, message: &str, kind: NotificationKind);

    /// Show the global loading indicator with a descriptive label
    fn show_loader(&self, _label: &str) {}

    /// Hide the global loading indicator
    fn hide_loader(&self) {}
}

/// Notifier that drops every message, for headless embeddings
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _message: &str, _kind: NotificationKind) {}
}
