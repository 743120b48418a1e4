//! Optimistic, device-local comments shown before the server confirms them.

use std::sync::Arc;

use chrono::Utc;

use super::{Attachment, Author, Comment, FileUri, LocalId};
use crate::files::FileResolver;
use crate::utils::random_hex;

/// Builds comments authored on this device.
pub struct LocalDataProvider {
    user_name: String,
    file_resolver: Arc<dyn FileResolver>,
}

impl LocalDataProvider {
    pub fn new(user_name: impl Into<String>, file_resolver: Arc<dyn FileResolver>) -> Self {
        Self {
            user_name: user_name.into(),
            file_resolver,
        }
    }

    /// Fresh correlation key for a local comment.
    pub fn new_local_id() -> LocalId {
        LocalId(format!("local-{}", random_hex(8)))
    }

    /// Text comment written by the user.
    pub fn create_local_comment(&self, text: impl Into<String>) -> Comment {
        Comment {
            id: None,
            body: text.into(),
            is_inbound: true,
            attachments: None,
            creation_date: Utc::now(),
            author: Author::new(self.user_name.clone()),
            local_id: Some(Self::new_local_id()),
        }
    }

    /// Comment carrying a single local file.
    ///
    /// Returns `None` if the file cannot be found.
    pub async fn create_local_file_comment(&self, uri: &FileUri) -> Option<Comment> {
        let data = self.file_resolver.file_data(uri).await?;
        let mut comment = self.create_local_comment(String::new());
        comment.attachments = Some(vec![Attachment::local(&data)]);
        Some(comment)
    }

    /// Text comment with any number of local files attached.
    ///
    /// Files that cannot be resolved are skipped with a warning.
    pub async fn create_local_comment_with_files(
        &self,
        text: impl Into<String>,
        uris: &[FileUri],
    ) -> Comment {
        let mut comment = self.create_local_comment(text);
        let mut attachments = Vec::with_capacity(uris.len());
        for uri in uris {
            match self.file_resolver.file_data(uri).await {
                Some(data) => attachments.push(Attachment::local(&data)),
                None => log::warn!("Skipping unreadable attachment {}", uri),
            }
        }
        if !attachments.is_empty() {
            comment.attachments = Some(attachments);
        }
        comment
    }
}
