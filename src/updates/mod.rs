//! Live update fan-out.
//!
//! Producers (the facade after a submission, push messages) publish typed
//! [`Update`]s; every registered subscriber interested in the update type
//! receives it synchronously on the publishing task.

pub mod tickets;

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::data::TicketId;
use crate::response::ResponseError;

pub use tickets::{TicketListHandle, TicketListState, TicketListWatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    TicketCreated,
    TicketUpdated,
    CommentAdded,
    FeedUpdated,
    NewReply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub kind: UpdateType,
    pub ticket_id: Option<TicketId>,
    /// Set when the operation behind the update failed.
    pub error: Option<ResponseError>,
}

impl Update {
    pub fn new(kind: UpdateType) -> Self {
        Self {
            kind,
            ticket_id: None,
            error: None,
        }
    }

    pub fn with_ticket(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    pub fn with_error(mut self, error: ResponseError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

pub trait UpdateSubscriber: Send + Sync {
    fn on_update(&self, update: &Update);

    /// Update types this subscriber wants. `None` means all of them.
    fn update_types(&self) -> Option<Vec<UpdateType>> {
        None
    }
}

/// Payload of a push notification.
#[derive(Debug, Deserialize)]
struct PushMessage {
    #[serde(rename = "type")]
    kind: UpdateType,
    #[serde(default)]
    ticket_id: Option<TicketId>,
}

/// Parse a push notification payload such as
/// `{"type": "new_reply", "ticket_id": 12}`.
pub fn parse_push_message(payload: &str) -> Result<Update, serde_json::Error> {
    let message: PushMessage = serde_json::from_str(payload)?;
    Ok(Update {
        kind: message.kind,
        ticket_id: message.ticket_id,
        error: None,
    })
}

/// Registry of update subscribers.
#[derive(Default)]
pub struct LiveUpdates {
    subscribers: RwLock<Vec<Arc<dyn UpdateSubscriber>>>,
}

impl LiveUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber`. Registering the same `Arc` twice is a no-op.
    pub fn subscribe(&self, subscriber: Arc<dyn UpdateSubscriber>) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        if !subscribers.iter().any(|s| Arc::ptr_eq(s, &subscriber)) {
            subscribers.push(subscriber);
        }
    }

    pub fn unsubscribe(&self, subscriber: &Arc<dyn UpdateSubscriber>) {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|s| !Arc::ptr_eq(s, subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Deliver `update` to every interested subscriber.
    pub fn publish(&self, update: Update) {
        // Snapshot so subscribers may (un)subscribe from their callback.
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let mut delivered = 0;
        for subscriber in subscribers {
            let wanted = subscriber
                .update_types()
                .map_or(true, |types| types.contains(&update.kind));
            if wanted {
                subscriber.on_update(&update);
                delivered += 1;
            }
        }
        log::debug!("Published {:?} to {} subscriber(s)", update.kind, delivered);
    }

    /// Publish the update carried by a push payload. Returns `false` if the
    /// payload is not recognised.
    pub fn on_push_message(&self, payload: &str) -> bool {
        match parse_push_message(payload) {
            Ok(update) => {
                self.publish(update);
                true
            }
            Err(e) => {
                log::warn!("Ignoring push message: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        filter: Option<Vec<UpdateType>>,
        seen: Mutex<Vec<Update>>,
    }

    impl Recorder {
        fn only(types: Vec<UpdateType>) -> Self {
            Self {
                filter: Some(types),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn kinds(&self) -> Vec<UpdateType> {
            self.seen.lock().unwrap().iter().map(|u| u.kind).collect()
        }
    }

    impl UpdateSubscriber for Recorder {
        fn on_update(&self, update: &Update) {
            self.seen.lock().unwrap().push(update.clone());
        }

        fn update_types(&self) -> Option<Vec<UpdateType>> {
            self.filter.clone()
        }
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let updates = LiveUpdates::new();
        let recorder: Arc<dyn UpdateSubscriber> = Arc::new(Recorder::default());

        updates.subscribe(recorder.clone());
        updates.subscribe(recorder.clone());
        assert_eq!(updates.subscriber_count(), 1);

        updates.unsubscribe(&recorder);
        updates.unsubscribe(&recorder);
        assert_eq!(updates.subscriber_count(), 0);
    }

    #[test]
    fn test_filter_by_type() {
        let updates = LiveUpdates::new();
        let all = Arc::new(Recorder::default());
        let created = Arc::new(Recorder::only(vec![UpdateType::TicketCreated]));
        updates.subscribe(all.clone());
        updates.subscribe(created.clone());

        updates.publish(Update::new(UpdateType::TicketCreated).with_ticket(TicketId(1)));
        updates.publish(Update::new(UpdateType::CommentAdded));

        assert_eq!(all.kinds(), vec![UpdateType::TicketCreated, UpdateType::CommentAdded]);
        assert_eq!(created.kinds(), vec![UpdateType::TicketCreated]);
    }

    #[test]
    fn test_push_message() {
        let updates = LiveUpdates::new();
        let recorder = Arc::new(Recorder::default());
        updates.subscribe(recorder.clone());

        assert!(updates.on_push_message(r#"{"type":"new_reply","ticket_id":12}"#));
        assert!(!updates.on_push_message(r#"{"type":"unknown"}"#));
        assert!(!updates.on_push_message("garbage"));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, UpdateType::NewReply);
        assert_eq!(seen[0].ticket_id, Some(TicketId(12)));
    }

    #[test]
    fn test_error_is_carried() {
        let update = Update::new(UpdateType::TicketCreated).with_error(ResponseError::no_internet());
        assert!(update.has_error());
        assert!(update.ticket_id.is_none());
    }
}
