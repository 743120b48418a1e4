//! Serialized execution of mutating requests.
//!
//! Ticket creation and comment submission run on a single worker task, one
//! at a time, in submission order. The worker owns the [`RequestQueue`]: it
//! registers each submission as soon as it arrives, including while another
//! request is in flight, so a ticket creation that resolves can bind the
//! comments queued behind it before they are sent.

pub mod queue;

pub use queue::{CommentRequest, EntryId, PendingRequest, RequestQueue};

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::data::{Comment, CommentId, TicketDescription, TicketId};
use crate::response::{Response, ResponseError};
use crate::upload::SharedHooks;

const WORKER_STOPPED: &str = "Request worker stopped";

/// Where a comment is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Ticket(TicketId),
    Feed,
}

/// Performs the network side of a queued request.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn create_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> Response<TicketId>;

    async fn add_comment(
        &self,
        target: CommentTarget,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> Response<CommentId>;
}

enum Submission {
    CreateTicket {
        description: TicketDescription,
        hooks: Option<SharedHooks>,
        reply: oneshot::Sender<Response<TicketId>>,
    },
    AddComment {
        ticket_id: TicketId,
        feed: bool,
        comment: Comment,
        hooks: Option<SharedHooks>,
        reply: oneshot::Sender<CommentDelivery>,
    },
}

/// A submission that has a queue entry and waits for its turn.
struct Job {
    entry: EntryId,
    submission: Submission,
}

/// Answer to a submitted request.
pub struct PendingResponse<T>(oneshot::Receiver<Response<T>>);

impl<T> PendingResponse<T> {
    pub async fn wait(self) -> Response<T> {
        self.0
            .await
            .unwrap_or_else(|_| Err(ResponseError::api(WORKER_STOPPED)))
    }
}

/// Outcome of a comment submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDelivery {
    /// Ticket the comment was sent to. Differs from the submitted id when a
    /// ticket creation queued ahead of it bound it. Always
    /// [`TicketId::EMPTY`] for feed comments.
    pub ticket_id: TicketId,
    pub result: Response<CommentId>,
}

/// Answer to a submitted comment.
pub struct PendingComment {
    ticket_id: TicketId,
    rx: oneshot::Receiver<CommentDelivery>,
}

impl PendingComment {
    pub async fn wait(self) -> Response<CommentId> {
        self.delivered().await.result
    }

    pub async fn delivered(self) -> CommentDelivery {
        let ticket_id = self.ticket_id;
        self.rx.await.unwrap_or_else(|_| CommentDelivery {
            ticket_id,
            result: Err(ResponseError::api(WORKER_STOPPED)),
        })
    }
}

/// Cloneable handle for submitting requests to the worker.
#[derive(Clone)]
pub struct RequestWorkerHandle {
    tx: mpsc::UnboundedSender<Submission>,
}

impl RequestWorkerHandle {
    /// Queue a ticket creation. The entry exists before this returns.
    pub fn submit_ticket(
        &self,
        description: TicketDescription,
        hooks: Option<SharedHooks>,
    ) -> PendingResponse<TicketId> {
        let (reply, rx) = oneshot::channel();
        self.send(Submission::CreateTicket {
            description,
            hooks,
            reply,
        });
        PendingResponse(rx)
    }

    /// Queue a comment for `ticket_id`, which may be [`TicketId::EMPTY`] when
    /// the ticket is still being created.
    pub fn submit_comment(
        &self,
        ticket_id: TicketId,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> PendingComment {
        self.submit_any_comment(ticket_id, false, comment, hooks)
    }

    pub fn submit_feed_comment(
        &self,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> PendingComment {
        self.submit_any_comment(TicketId::EMPTY, true, comment, hooks)
    }

    fn submit_any_comment(
        &self,
        ticket_id: TicketId,
        feed: bool,
        comment: Comment,
        hooks: Option<SharedHooks>,
    ) -> PendingComment {
        let (reply, rx) = oneshot::channel();
        self.send(Submission::AddComment {
            ticket_id,
            feed,
            comment,
            hooks,
            reply,
        });
        PendingComment { ticket_id, rx }
    }

    // A closed channel drops the submission and its reply sender, which the
    // caller observes as WORKER_STOPPED.
    fn send(&self, submission: Submission) {
        if self.tx.send(submission).is_err() {
            log::error!("Request worker is not running, submission dropped");
        }
    }
}

/// The single worker executing mutating requests.
pub struct RequestWorker {
    executor: Arc<dyn RequestExecutor>,
    queue: RequestQueue,
    backlog: VecDeque<Job>,
    rx: mpsc::UnboundedReceiver<Submission>,
    closed: bool,
}

impl RequestWorker {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(executor: Arc<dyn RequestExecutor>) -> RequestWorkerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = RequestWorker {
            executor,
            queue: RequestQueue::new(),
            backlog: VecDeque::new(),
            rx,
            closed: false,
        };
        tokio::spawn(worker.run());
        RequestWorkerHandle { tx }
    }

    /// Main run loop. Ends once every handle is dropped and the backlog is
    /// drained.
    async fn run(mut self) {
        log::debug!("Request worker started");
        loop {
            let job = match self.backlog.pop_front() {
                Some(job) => job,
                None if self.closed => break,
                None => match self.rx.recv().await {
                    Some(submission) => {
                        self.register(submission);
                        continue;
                    }
                    None => break,
                },
            };
            self.process(job).await;
        }
        log::debug!("Request worker stopped");
    }

    fn register(&mut self, submission: Submission) {
        let request = match &submission {
            Submission::CreateTicket { .. } => PendingRequest::TicketCreation,
            Submission::AddComment { ticket_id, .. } => PendingRequest::comment(*ticket_id),
        };
        let entry = self.queue.enqueue(request);
        log::debug!(
            "Queued {:?} as {:?} ({} pending)",
            self.queue.get(entry),
            entry,
            self.queue.len()
        );
        self.backlog.push_back(Job { entry, submission });
    }

    async fn process(&mut self, job: Job) {
        let Job { entry, submission } = job;
        match submission {
            Submission::CreateTicket {
                description,
                hooks,
                reply,
            } => {
                let executor = self.executor.clone();
                let call = async move { executor.create_ticket(description, hooks).await }.boxed();
                let result = self.execute(call).await;
                match &result {
                    Ok(ticket_id) => {
                        let bound = self.queue.complete_ticket_creation(entry, *ticket_id);
                        log::info!(
                            "Ticket {} created, {} queued comment(s) bound to it",
                            ticket_id,
                            bound
                        );
                    }
                    Err(e) => {
                        self.queue.dequeue(entry);
                        log::warn!("Ticket creation failed: {}", e);
                    }
                }
                let _ = reply.send(result);
            }
            Submission::AddComment {
                feed,
                comment,
                hooks,
                reply,
                ..
            } => {
                // Read at call time: a creation resolved earlier may have
                // bound this entry since it was queued.
                let ticket_id = self
                    .queue
                    .comment_ticket_id(entry)
                    .unwrap_or(TicketId::EMPTY);
                let (target, ticket_id) = if feed {
                    (CommentTarget::Feed, TicketId::EMPTY)
                } else {
                    if ticket_id.is_empty() {
                        log::warn!("Sending comment for a ticket that was never created");
                    }
                    (CommentTarget::Ticket(ticket_id), ticket_id)
                };
                let executor = self.executor.clone();
                let call = async move { executor.add_comment(target, comment, hooks).await }.boxed();
                let result = self.execute(call).await;
                self.queue.dequeue(entry);
                if let Err(e) = &result {
                    log::warn!("Comment submission to {:?} failed: {}", target, e);
                }
                let _ = reply.send(CommentDelivery { ticket_id, result });
            }
        }
    }

    /// Drive one request to completion while registering submissions that
    /// arrive meanwhile. Pending submissions are drained before the request
    /// is polled so that anything submitted before it resolved is queued.
    async fn execute<T>(&mut self, mut call: BoxFuture<'static, Response<T>>) -> Response<T> {
        loop {
            tokio::select! {
                biased;
                submission = self.rx.recv(), if !self.closed => match submission {
                    Some(submission) => self.register(submission),
                    None => self.closed = true,
                },
                result = &mut call => return result,
            }
        }
    }
}
