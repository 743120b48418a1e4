//! HTTP transport for the service desk backend.
//!
//! [`ServiceDeskApi`] is the raw request surface: it reports what the server
//! said (status, reason, body) or that no answer was obtainable. Mapping those
//! outcomes onto [`crate::response::Response`] happens one layer up in the
//! remote repository.

pub mod client;
mod endpoints;
pub mod types;
mod upload;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::data::TicketId;
use crate::files::FileUploadData;
use types::{AddCommentRequestBody, CreateTicketRequestBody, RequestBodyBase, SetPushTokenBody};

pub use client::ApiClient;

/// Raw answer obtained from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Reason phrase of the status line.
    pub message: String,
    /// Response body; `None` when the server sent nothing or it was unreadable.
    pub body: Option<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Successful response with a body, used by test doubles.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            message: "OK".to_string(),
            body: Some(body.into()),
        }
    }
}

/// No response could be obtained from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult = Result<ApiResponse, TransportError>;

/// Receives the number of bytes of the current file streamed so far.
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Request surface of the service desk backend.
///
/// `ApiClient` is the production implementation; tests substitute doubles to
/// drive every outcome of the repository mapping.
#[async_trait]
pub trait ServiceDeskApi: Send + Sync {
    async fn get_ticket_feed(&self, body: &RequestBodyBase) -> ApiResult;

    async fn get_tickets(&self, body: &RequestBodyBase) -> ApiResult;

    async fn get_ticket(&self, body: &RequestBodyBase, ticket_id: TicketId) -> ApiResult;

    async fn add_comment(&self, body: &AddCommentRequestBody, ticket_id: TicketId) -> ApiResult;

    async fn add_feed_comment(&self, body: &AddCommentRequestBody) -> ApiResult;

    async fn create_ticket(&self, body: &CreateTicketRequestBody) -> ApiResult;

    /// Stream one file to the server. The file handle is consumed and closed
    /// when the call returns.
    async fn upload_file(&self, file: FileUploadData, progress: Option<ProgressCallback>) -> ApiResult;

    async fn set_push_token(&self, body: &SetPushTokenBody) -> ApiResult;
}
