//! Remote repository backed by the HTTP API.
//!
//! Reads go straight to the API. Ticket creation and comments are handed to
//! the request worker, which runs them one at a time; the actual network work
//! for those lives in [`WebRequests`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::RemoteRepository;
use crate::api::types::{
    AddCommentRequestBody, CreateTicketRequestBody, FeedResponse, RequestBodyBase,
    SetPushTokenBody, TicketsResponse,
};
use crate::api::{ApiResponse, ApiResult, ServiceDeskApi};
use crate::data::{Comment, CommentId, Ticket, TicketDescription, TicketId, TicketShortDescription};
use crate::files::FileResolver;
use crate::response::{Response, ResponseError};
use crate::sync::{
    CommentDelivery, CommentTarget, RequestExecutor, RequestWorker, RequestWorkerHandle,
};
use crate::upload::{SharedHooks, Uploader};

const EMPTY_BODY: &str = "Empty response body";

/// Who is talking to the service desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub app_id: String,
    pub user_id: String,
    pub user_name: String,
}

impl ClientIdentity {
    fn base(&self) -> RequestBodyBase {
        RequestBodyBase::new(self.app_id.clone(), self.user_id.clone())
    }
}

/// Network side of queued requests: uploads attachments, then calls the
/// ticket or comment endpoint.
pub struct WebRequests {
    api: Arc<dyn ServiceDeskApi>,
    uploader: Uploader,
    identity: ClientIdentity,
}

impl WebRequests {
    pub fn new(
        api: Arc<dyn ServiceDeskApi>,
        resolver: Arc<dyn FileResolver>,
        identity: ClientIdentity,
    ) -> Self {
        Self {
            uploader: Uploader::new(api.clone(), resolver),
            api,
            identity,
        }
    }
}

#[async_trait]
impl RequestExecutor for WebRequests {
    async fn create_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> Response<TicketId> {
        let description = if description.has_attachments() {
            let attachments = description.attachments.as_deref().unwrap_or_default();
            let uploaded = self.uploader.upload(attachments, hooks.as_ref()).await?;
            description.with_attachments(uploaded)
        } else {
            description
        };
        let body = CreateTicketRequestBody::new(
            self.identity.base(),
            &self.identity.user_name,
            &description,
        );
        let id = parse_id(self.api.create_ticket(&body).await)?;
        log::info!("Created ticket {}", id);
        Ok(TicketId(id))
    }

    async fn add_comment(
        &self,
        target: CommentTarget,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        let comment = if comment.has_attachments() {
            let attachments = comment.attachments.as_deref().unwrap_or_default();
            let uploaded = self.uploader.upload(attachments, hooks.as_ref()).await?;
            comment.with_attachments(uploaded)
        } else {
            comment
        };
        let body = AddCommentRequestBody::new(self.identity.base(), &comment, &self.identity.user_name);
        let result = match target {
            CommentTarget::Ticket(ticket_id) => self.api.add_comment(&body, ticket_id).await,
            CommentTarget::Feed => self.api.add_feed_comment(&body).await,
        };
        parse_id(result)
    }
}

/// [`RemoteRepository`] talking to the HTTP API.
pub struct WebRepository {
    requests: Arc<WebRequests>,
    worker: RequestWorkerHandle,
}

impl WebRepository {
    /// Build the repository and start its request worker. Must be called from
    /// within a tokio runtime.
    pub fn new(
        api: Arc<dyn ServiceDeskApi>,
        resolver: Arc<dyn FileResolver>,
        identity: ClientIdentity,
    ) -> Self {
        let requests = Arc::new(WebRequests::new(api, resolver, identity));
        let worker = RequestWorker::spawn(requests.clone());
        Self { requests, worker }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.requests.identity
    }

    fn api(&self) -> &dyn ServiceDeskApi {
        self.requests.api.as_ref()
    }

    fn base(&self) -> RequestBodyBase {
        self.requests.identity.base()
    }
}

#[async_trait]
impl RemoteRepository for WebRepository {
    async fn get_feed(&self) -> Response<Vec<Comment>> {
        let feed: FeedResponse = parse(self.api().get_ticket_feed(&self.base()).await)?;
        Ok(feed.comments)
    }

    async fn get_tickets(&self) -> Response<Vec<TicketShortDescription>> {
        let tickets: TicketsResponse = parse(self.api().get_tickets(&self.base()).await)?;
        Ok(tickets.tickets)
    }

    async fn get_ticket(&self, ticket_id: TicketId) -> Response<Ticket> {
        let mut ticket: Ticket = parse(self.api().get_ticket(&self.base(), ticket_id).await)?;
        ticket.id.get_or_insert(ticket_id);
        Ok(ticket)
    }

    async fn add_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        self.worker
            .submit_comment(ticket_id, comment, hooks)
            .wait()
            .await
    }

    async fn deliver_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> CommentDelivery {
        self.worker
            .submit_comment(ticket_id, comment, hooks)
            .delivered()
            .await
    }

    async fn add_feed_comment(
        &self,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId> {
        self.worker.submit_feed_comment(comment, hooks).wait().await
    }

    async fn create_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> Response<TicketId> {
        self.worker.submit_ticket(description, hooks).wait().await
    }

    async fn set_push_token(&self, token: &str) -> Response<()> {
        let body = SetPushTokenBody {
            base: self.base(),
            token: token.to_string(),
        };
        check(self.api().set_push_token(&body).await).map(|_| ())
    }
}

/// Map the transport outcome: no answer at all, or an answer the server
/// marked as failed.
fn check(result: ApiResult) -> Response<ApiResponse> {
    match result {
        Err(e) => {
            log::warn!("Request did not reach the server: {}", e);
            Err(ResponseError::no_internet())
        }
        Ok(resp) if !resp.is_success() => {
            log::warn!("Server answered {} {}", resp.status, resp.message);
            if resp.message.is_empty() {
                Err(ResponseError::api(format!("HTTP {}", resp.status)))
            } else {
                Err(ResponseError::api(resp.message))
            }
        }
        Ok(resp) => Ok(resp),
    }
}

fn parse<T: DeserializeOwned>(result: ApiResult) -> Response<T> {
    let body = check(result)?
        .body
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| ResponseError::api(EMPTY_BODY))?;
    serde_json::from_str(&body).map_err(|e| {
        log::warn!("Unable to parse response body: {}", e);
        ResponseError::api(format!("Unable to parse response: {}", e))
    })
}

/// Id endpoints answer with a JSON object whose first value is the id.
fn parse_id(result: ApiResult) -> Response<i64> {
    let value: Value = parse(result)?;
    first_number(&value).ok_or_else(|| ResponseError::api(format!("No id in response: {}", value)))
}

fn first_number(value: &Value) -> Option<i64> {
    match value {
        Value::Object(map) => map.values().next()?.as_i64(),
        _ => None,
    }
}
