//! Unsent message text, kept per conversation.

use std::sync::Arc;

use super::{PreferenceStore, StorageError};
use crate::sync::CommentTarget;

pub struct DraftRepository {
    store: Arc<PreferenceStore>,
}

impl DraftRepository {
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self { store }
    }

    /// Saved draft for `target`, empty if there is none.
    pub fn draft(&self, target: CommentTarget) -> String {
        self.store.get(&key(target)).unwrap_or_default()
    }

    /// Save `text` as the draft for `target`. Empty text clears it.
    pub fn save_draft(&self, target: CommentTarget, text: &str) -> Result<(), StorageError> {
        if text.is_empty() {
            self.store.remove(&key(target))
        } else {
            self.store.set(&key(target), text)
        }
    }
}

fn key(target: CommentTarget) -> String {
    match target {
        CommentTarget::Feed => "draft.feed".to_string(),
        CommentTarget::Ticket(id) => format!("draft.ticket.{}", id),
    }
}
