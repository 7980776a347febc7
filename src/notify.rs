//! User-facing notifications.
//!
//! `notify` is fire-and-forget: callers never wait on presentation, so the
//! trait is synchronous and implementations must not block.

use std::sync::{Mutex, PoisonError};

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
    Info,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotifyKind, message: &str);
}

/// Logs notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        match kind {
            NotifyKind::Error => error!(%message, "notify"),
            NotifyKind::Success | NotifyKind::Info => info!(?kind, %message, "notify"),
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(NotifyKind, String)>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seen(&self) -> Vec<(NotifyKind, String)> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn count(&self, kind: NotifyKind) -> usize {
        self.seen().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).push((kind, message.to_owned()));
    }
}
