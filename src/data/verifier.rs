//! Checks that local comments still point at files on this device.

use std::sync::Arc;

use super::Comment;
use crate::files::FileResolver;

pub struct LocalDataVerifier {
    resolver: Arc<dyn FileResolver>,
}

impl LocalDataVerifier {
    pub fn new(resolver: Arc<dyn FileResolver>) -> Self {
        Self { resolver }
    }

    /// `false` if any not-yet-uploaded attachment of `comment` lost its file.
    pub async fn is_valid(&self, comment: &Comment) -> bool {
        let Some(attachments) = &comment.attachments else {
            return true;
        };
        for attachment in attachments.iter().filter(|a| !a.is_uploaded()) {
            let present = match &attachment.uri {
                Some(uri) => self.resolver.exists(uri).await,
                None => false,
            };
            if !present {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Attachment, LocalDataProvider};
    use crate::test_support::{local_attachment, MemoryResolver};

    #[tokio::test]
    async fn test_missing_file_invalidates_comment() {
        let resolver = Arc::new(MemoryResolver::new().with_file("/f/a.txt", b"a"));
        let verifier = LocalDataVerifier::new(resolver.clone());
        let provider = LocalDataProvider::new("me", resolver.clone());

        let text = provider.create_local_comment("just text");
        let with_file = text.with_attachments(vec![local_attachment("/f/a.txt", 1)]);
        let uploaded = text.with_attachments(vec![Attachment::remote("g", "b.txt", 1)]);

        assert!(verifier.is_valid(&text).await);
        assert!(verifier.is_valid(&with_file).await);
        assert!(verifier.is_valid(&uploaded).await);

        resolver.remove("/f/a.txt");
        assert!(!verifier.is_valid(&with_file).await);
    }
}
