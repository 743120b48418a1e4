//! Remote-first repository with an offline fallback.
//!
//! Successful reads refresh the offline snapshot; failed reads fall back to
//! it when one exists. Comments that could not be delivered are kept as
//! pending and shown after the server comments until a later submission of
//! the same local comment succeeds.

use std::sync::Arc;

use async_trait::async_trait;

use super::RemoteRepository;
use crate::data::{
    Comment, CommentId, LocalDataVerifier, Ticket, TicketDescription, TicketId,
    TicketShortDescription,
};
use crate::files::FileResolver;
use crate::response::Response;
use crate::storage::{OfflineRepository, StorageError};
use crate::sync::{CommentDelivery, CommentTarget};
use crate::upload::SharedHooks;

pub struct CentralRepository {
    remote: Arc<dyn RemoteRepository>,
    offline: Arc<dyn OfflineRepository>,
    verifier: LocalDataVerifier,
}

impl CentralRepository {
    pub fn new(
        remote: Arc<dyn RemoteRepository>,
        offline: Arc<dyn OfflineRepository>,
        resolver: Arc<dyn FileResolver>,
    ) -> Self {
        Self {
            remote,
            offline,
            verifier: LocalDataVerifier::new(resolver),
        }
    }

    /// Pending comments for `target` whose files still exist. The rest are
    /// forgotten.
    async fn pending(&self, target: CommentTarget) -> Vec<Comment> {
        let mut valid = Vec::new();
        for comment in self.offline.pending_comments(target) {
            if self.verifier.is_valid(&comment).await {
                valid.push(comment);
                continue;
            }
            log::info!("Dropping pending comment {:?}: attached file is gone", comment.local_id);
            if let Some(local_id) = comment.local_id {
                self.store("drop pending comment", move |offline| {
                    offline.remove_pending_comment(target, &local_id)
                })
                .await;
            }
        }
        valid
    }

    /// Record the outcome of a comment submission in the pending list.
    async fn settle_comment(
        &self,
        target: CommentTarget,
        comment: Comment,
        result: &Response<CommentId>,
    ) {
        let Some(local_id) = comment.local_id.clone() else {
            return;
        };
        match result {
            Err(_) if target == CommentTarget::Ticket(TicketId::EMPTY) => {
                log::warn!("Not keeping comment {} for a ticket that was never created", local_id);
            }
            Err(e) if !e.is_cancelled() => {
                log::info!("Keeping comment {} as pending: {}", local_id, e);
                self.store("keep pending comment", move |offline| {
                    offline.add_pending_comment(target, &comment)
                })
                .await;
            }
            _ => {
                self.store("remove pending comment", move |offline| {
                    offline.remove_pending_comment(target, &local_id)
                })
                .await;
            }
        }
    }

    /// Run a storage write on the blocking pool. Failures are logged.
    async fn store<F>(&self, what: &'static str, write: F)
    where
        F: FnOnce(&dyn OfflineRepository) -> Result<(), StorageError> + Send + 'static,
    {
        let offline = self.offline.clone();
        match tokio::task::spawn_blocking(move || write(offline.as_ref())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Failed to {}: {}", what, e),
            Err(e) => log::warn!("Failed to {}: {}", what, e),
        }
    }
}

#[async_trait]
impl RemoteRepository for CentralRepository {
    async fn get_feed(&self) -> Response<Vec<Comment>> {
        let mut comments = match self.remote.get_feed().await {
            Ok(comments) => {
                let snapshot = comments.clone();
                self.store("store feed snapshot", move |offline| {
                    offline.save_feed_snapshot(&snapshot)
                })
                .await;
                comments
            }
            Err(e) => match self.offline.feed_snapshot() {
                Some(snapshot) => {
                    log::info!("Feed unavailable ({}), using offline copy", e);
                    snapshot
                }
                None => return Err(e),
            },
        };
        comments.extend(self.pending(CommentTarget::Feed).await);
        Ok(comments)
    }

    async fn get_tickets(&self) -> Response<Vec<TicketShortDescription>> {
        match self.remote.get_tickets().await {
            Ok(tickets) => {
                let snapshot = tickets.clone();
                self.store("store ticket list snapshot", move |offline| {
                    offline.save_tickets_snapshot(&snapshot)
                })
                .await;
                Ok(tickets)
            }
            Err(e) => match self.offline.tickets_snapshot() {
                Some(snapshot) => {
                    log::info!("Ticket list unavailable ({}), using offline copy", e);
                    Ok(snapshot)
                }
                None => Err(e),
            },
        }
    }

    async fn get_ticket(&self, ticket_id: TicketId) -> Response<Ticket> {
        let mut ticket = match self.remote.get_ticket(ticket_id).await {
            Ok(ticket) => {
                let snapshot = ticket.clone();
                self.store("store ticket snapshot", move |offline| {
                    offline.save_ticket_snapshot(ticket_id, &snapshot)
                })
                .await;
                ticket
            }
            Err(e) => match self.offline.ticket_snapshot(ticket_id) {
                Some(snapshot) => {
                    log::info!("Ticket {} unavailable ({}), using offline copy", ticket_id, e);
                    snapshot
                }
                None => return Err(e),
            },
        };
        ticket
            .comments
            .extend(self.pending(CommentTarget::Ticket(ticket_id)).await);
        Ok(ticket)
    }

    async fn add_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        self.deliver_comment(ticket_id, comment, hooks).await.result
    }

    /// A comment queued behind a ticket creation is kept as pending under the
    /// ticket it was bound to.
    async fn deliver_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> CommentDelivery {
        let delivery = self
            .remote
            .deliver_comment(ticket_id, comment.clone(), hooks)
            .await;
        self.settle_comment(CommentTarget::Ticket(delivery.ticket_id), comment, &delivery.result)
            .await;
        delivery
    }

    async fn add_feed_comment(
        &self,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        let result = self.remote.add_feed_comment(comment.clone(), hooks).await;
        self.settle_comment(CommentTarget::Feed, comment, &result).await;
        result
    }

    async fn create_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> Response<TicketId> {
        self.remote.create_ticket(description, hooks).await
    }

    async fn set_push_token(&self, token: &str) -> Response<()> {
        self.remote.set_push_token(token).await
    }
}
