//! Ticket, comment and attachment model shared by every layer.
//!
//! Wire names follow the service desk API (snake_case). Fields that only
//! exist on the client (local ids, local file references) are skipped when
//! absent so server payloads and offline snapshots share one shape.

pub mod attachment;
pub mod local;
pub mod verifier;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use attachment::{Attachment, FileData, FileUri};
pub use local::LocalDataProvider;
pub use verifier::LocalDataVerifier;

/// Server-side ticket identifier.
///
/// [`TicketId::EMPTY`] marks a ticket that has not been created yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub i64);

impl TicketId {
    /// Sentinel for "not yet created on the server".
    pub const EMPTY: TicketId = TicketId(0);

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-side comment identifier.
pub type CommentId = i64;

/// Client-generated correlation key for a comment that may not have reached
/// the server yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub String);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Comment author as shown next to the message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar_id: None,
        }
    }
}

/// A single message in a ticket or in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "comment_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommentId>,
    #[serde(default)]
    pub body: String,
    /// `true` for messages written by the user, `false` for support replies.
    #[serde(default)]
    pub is_inbound: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(rename = "created_at")]
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub author: Author,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<LocalId>,
}

impl Comment {
    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }

    /// Copy of this comment with its attachments replaced.
    pub fn with_attachments(&self, attachments: Vec<Attachment>) -> Comment {
        Comment {
            attachments: Some(attachments),
            ..self.clone()
        }
    }

    /// A comment that exists only on this device.
    pub fn is_local(&self) -> bool {
        self.id.is_none() && self.local_id.is_some()
    }
}

/// Full ticket with its comment thread.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ticket_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TicketId>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Entry of the ticket list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketShortDescription {
    #[serde(rename = "ticket_id")]
    pub id: TicketId,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_comment: Option<Comment>,
}

/// Payload for creating a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDescription {
    pub subject: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl TicketDescription {
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            attachments: None,
        }
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }

    pub fn with_attachments(&self, attachments: Vec<Attachment>) -> TicketDescription {
        TicketDescription {
            attachments: Some(attachments),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_id_sentinel() {
        assert!(TicketId::EMPTY.is_empty());
        assert!(TicketId::default().is_empty());
        assert!(!TicketId(42).is_empty());
        assert_eq!(TicketId(42).to_string(), "42");
    }

    #[test]
    fn test_ticket_deserialization() {
        let json = r#"{
            "ticket_id": 17,
            "subject": "Printer",
            "comments": [{
                "comment_id": 5,
                "body": "It is on fire",
                "is_inbound": true,
                "created_at": "2019-03-01T10:00:00Z",
                "author": {"name": "Alice", "avatar_id": 3},
                "attachments": [{
                    "id": 9,
                    "guid": "abc",
                    "type": "image/png",
                    "name": "fire.png",
                    "bytes_size": 1024,
                    "is_text": false,
                    "is_video": false
                }]
            }]
        }"#;

        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.id, Some(TicketId(17)));
        assert_eq!(ticket.comments.len(), 1);
        let comment = &ticket.comments[0];
        assert_eq!(comment.id, Some(5));
        assert!(comment.is_inbound);
        assert_eq!(comment.author.avatar_id, Some(3));
        assert!(comment.local_id.is_none());
        let attachment = &comment.attachments.as_ref().unwrap()[0];
        assert_eq!(attachment.guid.as_deref(), Some("abc"));
        assert_eq!(attachment.bytes_size, 1024);
        assert!(attachment.uri.is_none());
    }

    #[test]
    fn test_local_fields_skipped_when_absent() {
        let comment = Comment {
            id: Some(1),
            body: "hi".into(),
            is_inbound: true,
            attachments: None,
            creation_date: Utc::now(),
            author: Author::new("Bob"),
            local_id: None,
        };
        let json = serde_json::to_string(&comment).unwrap();
        assert!(!json.contains("local_id"));
        assert!(!json.contains("attachments"));
        assert!(json.contains("\"comment_id\":1"));
    }

    #[test]
    fn test_with_attachments_keeps_other_fields() {
        let comment = Comment {
            id: None,
            body: "see file".into(),
            is_inbound: true,
            attachments: None,
            creation_date: Utc::now(),
            author: Author::new("Bob"),
            local_id: Some(LocalId("l-1".into())),
        };
        let updated = comment.with_attachments(vec![Attachment::remote("g", "a.txt", 3)]);
        assert!(updated.has_attachments());
        assert_eq!(updated.body, comment.body);
        assert_eq!(updated.local_id, comment.local_id);
        assert_eq!(updated.creation_date, comment.creation_date);
    }

    #[test]
    fn test_empty_attachment_list_is_not_attachments() {
        let description = TicketDescription::new("s", "d").with_attachments(vec![]);
        assert!(!description.has_attachments());
    }
}
