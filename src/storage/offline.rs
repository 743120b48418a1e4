//! Last known server state and comments that failed to send.

use std::sync::Arc;

use super::{PreferenceStore, StorageError};
use crate::data::{Comment, LocalId, Ticket, TicketId, TicketShortDescription};
use crate::sync::CommentTarget;

/// Snapshot and pending-comment storage used when the server is unreachable.
pub trait OfflineRepository: Send + Sync {
    fn feed_snapshot(&self) -> Option<Vec<Comment>>;

    fn save_feed_snapshot(&self, comments: &[Comment]) -> Result<(), StorageError>;

    fn tickets_snapshot(&self) -> Option<Vec<TicketShortDescription>>;

    fn save_tickets_snapshot(&self, tickets: &[TicketShortDescription]) -> Result<(), StorageError>;

    fn ticket_snapshot(&self, ticket_id: TicketId) -> Option<Ticket>;

    fn save_ticket_snapshot(&self, ticket_id: TicketId, ticket: &Ticket) -> Result<(), StorageError>;

    /// Comments for `target` that could not be delivered, oldest first.
    fn pending_comments(&self, target: CommentTarget) -> Vec<Comment>;

    /// Remember a comment that could not be delivered. A comment with the
    /// same local id replaces the earlier copy.
    fn add_pending_comment(&self, target: CommentTarget, comment: &Comment) -> Result<(), StorageError>;

    fn remove_pending_comment(&self, target: CommentTarget, local_id: &LocalId) -> Result<(), StorageError>;
}

/// [`OfflineRepository`] kept in the [`PreferenceStore`].
pub struct PreferenceOfflineRepository {
    store: Arc<PreferenceStore>,
}

impl PreferenceOfflineRepository {
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self { store }
    }
}

const FEED_KEY: &str = "offline.feed";
const TICKETS_KEY: &str = "offline.tickets";

fn ticket_key(ticket_id: TicketId) -> String {
    format!("offline.ticket.{}", ticket_id)
}

fn pending_key(target: CommentTarget) -> String {
    match target {
        CommentTarget::Feed => "pending.feed".to_string(),
        CommentTarget::Ticket(id) => format!("pending.ticket.{}", id),
    }
}

impl OfflineRepository for PreferenceOfflineRepository {
    fn feed_snapshot(&self) -> Option<Vec<Comment>> {
        self.store.get(FEED_KEY)
    }

    fn save_feed_snapshot(&self, comments: &[Comment]) -> Result<(), StorageError> {
        self.store.set(FEED_KEY, comments)
    }

    fn tickets_snapshot(&self) -> Option<Vec<TicketShortDescription>> {
        self.store.get(TICKETS_KEY)
    }

    fn save_tickets_snapshot(&self, tickets: &[TicketShortDescription]) -> Result<(), StorageError> {
        self.store.set(TICKETS_KEY, tickets)
    }

    fn ticket_snapshot(&self, ticket_id: TicketId) -> Option<Ticket> {
        self.store.get(&ticket_key(ticket_id))
    }

    fn save_ticket_snapshot(&self, ticket_id: TicketId, ticket: &Ticket) -> Result<(), StorageError> {
        self.store.set(&ticket_key(ticket_id), ticket)
    }

    fn pending_comments(&self, target: CommentTarget) -> Vec<Comment> {
        self.store.get(&pending_key(target)).unwrap_or_default()
    }

    fn add_pending_comment(&self, target: CommentTarget, comment: &Comment) -> Result<(), StorageError> {
        let mut pending = self.pending_comments(target);
        if let Some(local_id) = &comment.local_id {
            pending.retain(|c| c.local_id.as_ref() != Some(local_id));
        }
        pending.push(comment.clone());
        log::debug!("{} pending comment(s) for {:?}", pending.len(), target);
        self.store.set(&pending_key(target), &pending)
    }

    fn remove_pending_comment(&self, target: CommentTarget, local_id: &LocalId) -> Result<(), StorageError> {
        let mut pending = self.pending_comments(target);
        let before = pending.len();
        pending.retain(|c| c.local_id.as_ref() != Some(local_id));
        if pending.len() == before {
            return Ok(());
        }
        if pending.is_empty() {
            self.store.remove(&pending_key(target))
        } else {
            self.store.set(&pending_key(target), &pending)
        }
    }
}
