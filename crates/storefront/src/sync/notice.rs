//! User-visible notifications.
//!
//! No synchronization failure is fatal. Load, save and migration failures are
//! queued here and handed to the presentation layer, which shows them as
//! transient messages.

use std::sync::{Arc, Mutex, PoisonError};

use gemcase_core::CollectionKind;
use serde::Serialize;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// A remote load failed; the collection was left empty.
    #[must_use]
    pub fn load_failed(kind: CollectionKind) -> Self {
        Self::error(format!("Failed to load {kind} items"))
    }

    /// Saved local data could not be read and was discarded.
    #[must_use]
    pub fn local_unreadable(kind: CollectionKind) -> Self {
        Self::error(format!("Your saved {kind} could not be read and was reset"))
    }

    /// A write to either store failed.
    #[must_use]
    pub fn save_failed(kind: CollectionKind) -> Self {
        Self::error(format!("Failed to save {kind}"))
    }

    /// Local items were copied to the shopper's account.
    #[must_use]
    pub fn transferred(kind: CollectionKind) -> Self {
        Self::success(format!("{} items transferred to your account!", kind.title()))
    }

    /// At least one local item could not be copied to the account.
    #[must_use]
    pub fn transfer_failed(kind: CollectionKind) -> Self {
        Self::error(format!("Failed to transfer {kind} items"))
    }
}

/// Shared notice queue.
///
/// Cloned into background writes so failures that happen after the caller
/// moved on are still reported.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    queue: Arc<Mutex<Vec<Notice>>>,
}

impl Notices {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice.
    pub fn push(&self, notice: Notice) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    /// Remove and return every queued notice, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of queued notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_queue_in_order() {
        let notices = Notices::new();
        let shared = notices.clone();
        notices.push(Notice::error("Failed to save cart"));
        shared.push(Notice::success("Cart items transferred to your account!"));

        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Error);
        assert_eq!(drained[1].level, NoticeLevel::Success);
        assert!(shared.is_empty());
    }

    #[test]
    fn test_kind_messages() {
        assert_eq!(
            Notice::load_failed(CollectionKind::Cart).message,
            "Failed to load cart items"
        );
        assert_eq!(
            Notice::save_failed(CollectionKind::Wishlist).message,
            "Failed to save wishlist"
        );
        assert_eq!(
            Notice::transferred(CollectionKind::Wishlist).message,
            "Wishlist items transferred to your account!"
        );
        assert_eq!(
            Notice::transfer_failed(CollectionKind::Cart).level,
            NoticeLevel::Error
        );
    }

    #[test]
    fn test_notice_serializes_lowercase_level() {
        let json = serde_json::to_value(Notice::error("oops")).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({ "level": "error", "message": "oops" }))
        );
    }
}
