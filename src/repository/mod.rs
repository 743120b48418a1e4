//! Repositories the facade talks to.
//!
//! [`WebRepository`] maps raw API answers onto [`Response`]s and serializes
//! mutating calls through the request worker. [`CentralRepository`] wraps any
//! remote repository with offline snapshots and pending comments.

pub mod central;
pub mod web;

use async_trait::async_trait;

use crate::data::{Comment, CommentId, Ticket, TicketDescription, TicketId, TicketShortDescription};
use crate::response::Response;
use crate::sync::CommentDelivery;
use crate::upload::SharedHooks;

pub use central::CentralRepository;
pub use web::WebRepository;

/// Remote operations of the service desk.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Comments of the user's feed, oldest first.
    async fn get_feed(&self) -> Response<Vec<Comment>>;

    async fn get_tickets(&self) -> Response<Vec<TicketShortDescription>>;

    async fn get_ticket(&self, ticket_id: TicketId) -> Response<Ticket>;

    /// Post `comment` to `ticket_id`, which may be [`TicketId::EMPTY`] while
    /// the ticket is still being created by an earlier call.
    async fn add_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId>;

    /// [`RemoteRepository::add_comment`], also reporting the ticket the
    /// comment was finally sent to.
    async fn deliver_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> CommentDelivery {
        CommentDelivery {
            ticket_id,
            result: self.add_comment(ticket_id, comment, hooks).await,
        }
    }

    async fn add_feed_comment(
        &self,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId>;

    async fn create_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> Response<TicketId>;

    async fn set_push_token(&self, token: &str) -> Response<()>;
}
