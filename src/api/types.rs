//! Request and response bodies for the service desk API.
//!
//! All structs use the API's snake_case field names. Every request carries the
//! application id and the stable user id.

use serde::{Deserialize, Serialize};

use crate::data::{Attachment, Comment, TicketDescription, TicketShortDescription};

/// Identity fields included in every request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestBodyBase {
    pub app_id: String,
    pub user_id: String,
}

impl RequestBodyBase {
    pub fn new(app_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Reference to an already uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentBody {
    pub guid: String,
    pub name: String,
}

impl From<&Attachment> for AttachmentBody {
    fn from(attachment: &Attachment) -> Self {
        Self {
            guid: attachment.guid.clone().unwrap_or_default(),
            name: attachment.name.clone(),
        }
    }
}

fn attachment_bodies(attachments: Option<&Vec<Attachment>>) -> Option<Vec<AttachmentBody>> {
    attachments
        .filter(|a| !a.is_empty())
        .map(|a| a.iter().map(AttachmentBody::from).collect())
}

/// Body of POST addcomment/{ticket_id} and POST addfeedcomment.
#[derive(Debug, Clone, Serialize)]
pub struct AddCommentRequestBody {
    #[serde(flatten)]
    pub base: RequestBodyBase,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentBody>>,
    pub user_name: String,
}

impl AddCommentRequestBody {
    pub fn new(base: RequestBodyBase, comment: &Comment, user_name: &str) -> Self {
        Self {
            base,
            comment: comment.body.clone(),
            attachments: attachment_bodies(comment.attachments.as_ref()),
            user_name: user_name.to_string(),
        }
    }
}

/// Ticket part of the create-ticket request.
#[derive(Debug, Clone, Serialize)]
pub struct TicketBody {
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentBody>>,
}

/// Body of POST createticket.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTicketRequestBody {
    #[serde(flatten)]
    pub base: RequestBodyBase,
    pub user_name: String,
    pub ticket: TicketBody,
}

impl CreateTicketRequestBody {
    pub fn new(base: RequestBodyBase, user_name: &str, description: &TicketDescription) -> Self {
        Self {
            base,
            user_name: user_name.to_string(),
            ticket: TicketBody {
                subject: description.subject.clone(),
                description: description.description.clone(),
                attachments: attachment_bodies(description.attachments.as_ref()),
            },
        }
    }
}

/// Body of POST setpushtoken.
#[derive(Debug, Clone, Serialize)]
pub struct SetPushTokenBody {
    #[serde(flatten)]
    pub base: RequestBodyBase,
    pub token: String,
}

/// Response of POST getticketfeed.
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Response of POST gettickets.
#[derive(Debug, Deserialize)]
pub struct TicketsResponse {
    #[serde(default)]
    pub tickets: Vec<TicketShortDescription>,
}

/// Response of POST uploadfile.
#[derive(Debug, Deserialize)]
pub struct UploadFileResponse {
    pub guid: String,
}
