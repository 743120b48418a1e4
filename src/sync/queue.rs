//! In-flight request arena for ticket creation and comment submission.
//!
//! Entries are kept in insertion order. A comment submitted for a ticket
//! that is still being created carries [`TicketId::EMPTY`]; when the creation
//! resolves, the contiguous run of such comments queued behind it is bound to
//! the new id.
//!
//! Memory-only: entries do not survive a restart. The arena is owned by the
//! request worker task and is never shared, so it needs no locking.

use std::collections::VecDeque;

use crate::data::TicketId;

/// Position-stable handle of an arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

/// Comment submission waiting for its network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRequest {
    ticket_id: TicketId,
}

impl CommentRequest {
    pub fn new(ticket_id: TicketId) -> Self {
        Self { ticket_id }
    }

    pub fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    pub fn is_unbound(&self) -> bool {
        self.ticket_id.is_empty()
    }

    /// Bind an unbound request. A bound ticket id never changes.
    fn bind(&mut self, ticket_id: TicketId) {
        if self.is_unbound() {
            self.ticket_id = ticket_id;
        }
    }
}

/// A queued mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    Comment(CommentRequest),
    /// Barrier for comments submitted after it.
    TicketCreation,
}

impl PendingRequest {
    pub fn comment(ticket_id: TicketId) -> Self {
        PendingRequest::Comment(CommentRequest::new(ticket_id))
    }
}

/// FIFO arena of pending requests.
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: VecDeque<(EntryId, PendingRequest)>,
    next_id: u64,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request to the back of the queue.
    pub fn enqueue(&mut self, request: PendingRequest) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push_back((id, request));
        id
    }

    /// Remove the entry with the given id. Absent ids are a no-op.
    pub fn dequeue(&mut self, id: EntryId) -> Option<PendingRequest> {
        let position = self.position(id)?;
        self.entries.remove(position).map(|(_, request)| request)
    }

    pub fn dequeue_head(&mut self) -> Option<(EntryId, PendingRequest)> {
        self.entries.pop_front()
    }

    pub fn get(&self, id: EntryId) -> Option<&PendingRequest> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, request)| request)
    }

    /// Ticket id currently carried by a comment entry.
    pub fn comment_ticket_id(&self, id: EntryId) -> Option<TicketId> {
        match self.get(id)? {
            PendingRequest::Comment(comment) => Some(comment.ticket_id()),
            PendingRequest::TicketCreation => None,
        }
    }

    /// Remove a resolved ticket creation and bind the comments queued behind
    /// it. Returns how many comments were bound.
    ///
    /// The scan starts where the creation entry stood and stops at the first
    /// entry that is not an unbound comment, even if unbound comments follow
    /// further back.
    pub fn complete_ticket_creation(&mut self, id: EntryId, ticket_id: TicketId) -> usize {
        let Some(position) = self.position(id) else {
            log::warn!("Ticket creation entry {:?} is no longer queued", id);
            return 0;
        };
        self.entries.remove(position);

        let mut bound = 0;
        for (_, request) in self.entries.iter_mut().skip(position) {
            match request {
                PendingRequest::Comment(comment) if comment.is_unbound() => {
                    comment.bind(ticket_id);
                    bound += 1;
                }
                _ => break,
            }
        }
        bound
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &PendingRequest)> {
        self.entries.iter().map(|(id, request)| (*id, request))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|(entry, _)| *entry == id)
    }
}
