use crate::core::SyncError;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible message raised by the synchronization layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Blocking notice after a rolled-back user action
    pub fn save_failed(op: &str, err: &SyncError) -> Self {
        Self::new(
            NoticeLevel::Error,
            "Save failed",
            format!("Could not {op} ({err}). Check your connection and try again."),
        )
    }

    pub fn session_expired() -> Self {
        Self::new(
            NoticeLevel::Warning,
            "Session expired",
            "You were logged out after a period of inactivity.",
        )
    }

    pub fn offline() -> Self {
        Self::new(
            NoticeLevel::Warning,
            "Offline",
            "Some records could not be loaded. Changes may not be saved.",
        )
    }
}

/// Fan-out of notices to whoever renders them, plus a history for late readers.
#[derive(Clone)]
pub struct NoticeBoard {
    sender: broadcast::Sender<Notice>,
    history: Arc<Mutex<Vec<Notice>>>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            sender,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn publish(&self, notice: Notice) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
        // nobody listening is fine; the history keeps it
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn history(&self) -> Vec<Notice> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|notice| notice.level == level)
            .count()
    }
}
