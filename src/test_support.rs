//! Test doubles for the transport and file layers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;

use crate::api::types::{AddCommentRequestBody, CreateTicketRequestBody, RequestBodyBase, SetPushTokenBody};
use crate::api::{ApiResponse, ApiResult, ProgressCallback, ServiceDeskApi, TransportError};
use crate::data::{Attachment, FileData, FileUri, TicketId};
use crate::files::{FileResolver, FileUploadData};

/// Canned answer for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    /// 200 with no body.
    Empty,
    Status(u16, &'static str),
    Offline,
}

impl Reply {
    fn into_result(self) -> ApiResult {
        match self {
            Reply::Ok(body) => Ok(ApiResponse::ok(body)),
            Reply::Empty => Ok(ApiResponse {
                status: 200,
                message: "OK".into(),
                body: None,
            }),
            Reply::Status(status, message) => Ok(ApiResponse {
                status,
                message: message.into(),
                body: None,
            }),
            Reply::Offline => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

/// Request observed by [`MockApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Feed,
    Tickets,
    Ticket(TicketId),
    AddComment(TicketId, String),
    AddFeedComment(String),
    CreateTicket(String, Vec<String>),
    Upload(String),
    PushToken(String),
}

pub const FEED: &str = "feed";
pub const TICKETS: &str = "tickets";
pub const TICKET: &str = "ticket";
pub const ADD_COMMENT: &str = "add_comment";
pub const ADD_FEED_COMMENT: &str = "add_feed_comment";
pub const CREATE_TICKET: &str = "create_ticket";
pub const UPLOAD: &str = "upload";
pub const PUSH_TOKEN: &str = "push_token";

type UploadObserver = Arc<dyn Fn(usize) + Send + Sync>;

/// Scriptable [`ServiceDeskApi`] that records every call.
pub struct MockApi {
    replies: Mutex<HashMap<&'static str, Reply>>,
    calls: Mutex<Vec<Call>>,
    uploads: AtomicUsize,
    create_gate: Mutex<Option<oneshot::Receiver<()>>>,
    upload_observer: Mutex<Option<UploadObserver>>,
}

impl MockApi {
    pub fn new() -> Self {
        let mut replies = HashMap::new();
        replies.insert(FEED, Reply::Ok(r#"{"comments":[]}"#.into()));
        replies.insert(TICKETS, Reply::Ok(r#"{"tickets":[]}"#.into()));
        replies.insert(TICKET, Reply::Ok(r#"{"ticket_id":1,"subject":"s","comments":[]}"#.into()));
        replies.insert(ADD_COMMENT, Reply::Ok(r#"{"comment_id":100}"#.into()));
        replies.insert(ADD_FEED_COMMENT, Reply::Ok(r#"{"comment_id":200}"#.into()));
        replies.insert(CREATE_TICKET, Reply::Ok(r#"{"ticket_id":42}"#.into()));
        replies.insert(PUSH_TOKEN, Reply::Empty);
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
            uploads: AtomicUsize::new(0),
            create_gate: Mutex::new(None),
            upload_observer: Mutex::new(None),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn reply(&self, endpoint: &'static str, reply: Reply) {
        self.replies.lock().unwrap().insert(endpoint, reply);
    }

    /// Hold every create-ticket call until the returned sender fires.
    pub fn gate_create_ticket(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.create_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Invoke `observer` with the running upload count after each upload.
    pub fn on_upload(&self, observer: impl Fn(usize) + Send + Sync + 'static) {
        *self.upload_observer.lock().unwrap() = Some(Arc::new(observer));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn answer(&self, endpoint: &'static str) -> ApiResult {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or(Reply::Empty);
        reply.into_result()
    }
}

#[async_trait]
impl ServiceDeskApi for MockApi {
    async fn get_ticket_feed(&self, _body: &RequestBodyBase) -> ApiResult {
        self.record(Call::Feed);
        self.answer(FEED)
    }

    async fn get_tickets(&self, _body: &RequestBodyBase) -> ApiResult {
        self.record(Call::Tickets);
        self.answer(TICKETS)
    }

    async fn get_ticket(&self, _body: &RequestBodyBase, ticket_id: TicketId) -> ApiResult {
        self.record(Call::Ticket(ticket_id));
        self.answer(TICKET)
    }

    async fn add_comment(&self, body: &AddCommentRequestBody, ticket_id: TicketId) -> ApiResult {
        self.record(Call::AddComment(ticket_id, body.comment.clone()));
        self.answer(ADD_COMMENT)
    }

    async fn add_feed_comment(&self, body: &AddCommentRequestBody) -> ApiResult {
        self.record(Call::AddFeedComment(body.comment.clone()));
        self.answer(ADD_FEED_COMMENT)
    }

    async fn create_ticket(&self, body: &CreateTicketRequestBody) -> ApiResult {
        let gate = self.create_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let guids = body
            .ticket
            .attachments
            .as_ref()
            .map(|a| a.iter().map(|b| b.guid.clone()).collect())
            .unwrap_or_default();
        self.record(Call::CreateTicket(body.ticket.subject.clone(), guids));
        self.answer(CREATE_TICKET)
    }

    async fn upload_file(&self, mut file: FileUploadData, progress: Option<ProgressCallback>) -> ApiResult {
        let mut content = Vec::new();
        file.content.read_to_end(&mut content).await?;
        if let Some(cb) = &progress {
            cb(content.len() as u64);
        }
        self.record(Call::Upload(file.file_name.clone()));
        let count = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let observer = self.upload_observer.lock().unwrap().clone();
        if let Some(observer) = observer {
            observer(count);
        }
        let scripted = self.replies.lock().unwrap().get(UPLOAD).cloned();
        match scripted {
            Some(reply) => reply.into_result(),
            None => Ok(ApiResponse::ok(format!(r#"{{"guid":"guid-{}"}}"#, count))),
        }
    }

    async fn set_push_token(&self, body: &SetPushTokenBody) -> ApiResult {
        self.record(Call::PushToken(body.token.clone()));
        self.answer(PUSH_TOKEN)
    }
}

/// In-memory [`FileResolver`] keyed by URI string.
#[derive(Default)]
pub struct MemoryResolver {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, uri: &str, content: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(uri.to_string(), content.to_vec());
        self
    }

    pub fn remove(&self, uri: &str) {
        self.files.lock().unwrap().remove(uri);
    }
}

fn name_of(uri: &FileUri) -> String {
    uri.as_str().rsplit('/').next().unwrap_or_default().to_string()
}

#[async_trait]
impl FileResolver for MemoryResolver {
    async fn resolve_for_upload(&self, uri: &FileUri) -> Option<FileUploadData> {
        let content = self.files.lock().unwrap().get(uri.as_str()).cloned()?;
        Some(FileUploadData {
            file_name: name_of(uri),
            bytes_size: Some(content.len() as u64),
            content: Box::new(std::io::Cursor::new(content)),
        })
    }

    async fn file_data(&self, uri: &FileUri) -> Option<FileData> {
        let len = self.files.lock().unwrap().get(uri.as_str())?.len();
        Some(FileData {
            name: name_of(uri),
            bytes_size: len as u64,
            uri: uri.clone(),
            is_local: true,
        })
    }
}

/// Local attachment pointing at `uri`.
pub fn local_attachment(uri: &str, size: u64) -> Attachment {
    Attachment::local(&FileData {
        name: uri.rsplit('/').next().unwrap_or_default().to_string(),
        bytes_size: size,
        uri: FileUri::new(uri),
        is_local: true,
    })
}
