//! Attachment upload orchestration.
//!
//! Files are uploaded strictly one after another in input order. The batch
//! is all-or-nothing: any failure or a cancellation observed between files
//! aborts it, and nothing uploaded so far is handed back to the caller.
//! Files already accepted by the server are not rolled back.

pub mod hooks;

use std::sync::Arc;

use thiserror::Error;

use crate::api::types::UploadFileResponse;
use crate::api::{ProgressCallback, ServiceDeskApi};
use crate::data::Attachment;
use crate::files::FileResolver;
use crate::response::{ResponseError, UPLOAD_CANCELLED_MESSAGE};

pub use hooks::{SharedHooks, UploadFileHooks, UploadHooks};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Attachment {0} has no local file")]
    MissingReference(String),
    #[error("Unable to read file {0}")]
    Unresolvable(String),
    #[error("Upload of {name} was rejected: {message}")]
    Rejected { name: String, message: String },
    #[error("Unexpected upload response for {0}")]
    InvalidResponse(String),
    #[error("Upload of {name} failed: {message}")]
    Transport { name: String, message: String },
    #[error("File upload cancelled")]
    Cancelled,
}

impl From<UploadError> for ResponseError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Cancelled => ResponseError::api(UPLOAD_CANCELLED_MESSAGE),
            other => ResponseError::api(other.to_string()),
        }
    }
}

/// Uploads local attachments and swaps their file references for GUIDs.
#[derive(Clone)]
pub struct Uploader {
    api: Arc<dyn ServiceDeskApi>,
    resolver: Arc<dyn FileResolver>,
}

impl Uploader {
    pub fn new(api: Arc<dyn ServiceDeskApi>, resolver: Arc<dyn FileResolver>) -> Self {
        Self { api, resolver }
    }

    /// Upload every attachment in order.
    ///
    /// On success the returned list matches the input one-to-one, each entry
    /// carrying its server GUID and no local URI.
    pub async fn upload(
        &self,
        attachments: &[Attachment],
        hooks: Option<&SharedHooks>,
    ) -> Result<Vec<Attachment>, UploadError> {
        let total_bytes: u64 = attachments.iter().map(|a| a.bytes_size).sum();
        let count = attachments.len();
        let mut uploaded = Vec::with_capacity(count);
        let mut done_bytes = 0u64;

        for (index, attachment) in attachments.iter().enumerate() {
            if is_cancelled(hooks) {
                log::info!("Upload cancelled before {}", attachment.name);
                return Err(UploadError::Cancelled);
            }

            let uri = attachment
                .uri
                .as_ref()
                .ok_or_else(|| UploadError::MissingReference(attachment.name.clone()))?;
            let file = self
                .resolver
                .resolve_for_upload(uri)
                .await
                .ok_or_else(|| UploadError::Unresolvable(uri.to_string()))?;

            let progress = hooks.map(|h| progress_callback(h.clone(), done_bytes, total_bytes));
            log::debug!("Uploading {} ({}/{})", attachment.name, index + 1, count);
            let result = self.api.upload_file(file, progress).await;

            if is_cancelled(hooks) {
                log::info!(
                    "Upload cancelled after {} of {} files",
                    index + 1,
                    count
                );
                return Err(UploadError::Cancelled);
            }

            let resp = result.map_err(|e| UploadError::Transport {
                name: attachment.name.clone(),
                message: e.to_string(),
            })?;
            if !resp.is_success() {
                return Err(UploadError::Rejected {
                    name: attachment.name.clone(),
                    message: resp.message,
                });
            }
            let guid = resp
                .body
                .as_deref()
                .and_then(|b| serde_json::from_str::<UploadFileResponse>(b).ok())
                .map(|r| r.guid)
                .filter(|g| !g.is_empty())
                .ok_or_else(|| UploadError::InvalidResponse(attachment.name.clone()))?;

            uploaded.push(attachment.clone().into_uploaded(guid));
            done_bytes += attachment.bytes_size;
            if let Some(h) = hooks {
                h.report_progress(batch_fraction(done_bytes, total_bytes, index + 1, count));
            }
        }

        Ok(uploaded)
    }
}

fn is_cancelled(hooks: Option<&SharedHooks>) -> bool {
    hooks.is_some_and(|h| h.is_cancelled())
}

fn progress_callback(hooks: SharedHooks, done_bytes: u64, total_bytes: u64) -> ProgressCallback {
    Arc::new(move |sent: u64| {
        if total_bytes > 0 {
            let fraction = (done_bytes + sent) as f64 / total_bytes as f64;
            hooks.report_progress(fraction.min(1.0) as f32);
        }
    })
}

/// Overall fraction at a file boundary. Falls back to file count when sizes
/// are unknown.
fn batch_fraction(done_bytes: u64, total_bytes: u64, done_files: usize, files: usize) -> f32 {
    if total_bytes > 0 {
        (done_bytes as f64 / total_bytes as f64).min(1.0) as f32
    } else if files > 0 {
        done_files as f32 / files as f32
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_attachment, Call, MemoryResolver, MockApi, Reply, UPLOAD};

    fn resolver() -> Arc<MemoryResolver> {
        Arc::new(
            MemoryResolver::new()
                .with_file("/f/a.txt", b"aaaa")
                .with_file("/f/b.png", b"bbbbbbbb")
                .with_file("/f/c.mp4", b"cccc"),
        )
    }

    fn batch() -> Vec<Attachment> {
        vec![
            local_attachment("/f/a.txt", 4),
            local_attachment("/f/b.png", 8),
            local_attachment("/f/c.mp4", 4),
        ]
    }

    #[tokio::test]
    async fn test_uploads_in_order_and_replaces_uri() {
        let api = MockApi::shared();
        let uploader = Uploader::new(api.clone(), resolver());
        let input = batch();

        let uploaded = uploader.upload(&input, None).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                Call::Upload("a.txt".into()),
                Call::Upload("b.png".into()),
                Call::Upload("c.mp4".into()),
            ]
        );
        assert_eq!(uploaded.len(), 3);
        for (i, (before, after)) in input.iter().zip(&uploaded).enumerate() {
            assert_eq!(after.guid, Some(format!("guid-{}", i + 1)));
            assert!(after.uri.is_none());
            assert_eq!(after.name, before.name);
            assert_eq!(after.bytes_size, before.bytes_size);
            assert_eq!(after.media_type, before.media_type);
            assert_eq!(after.is_text, before.is_text);
            assert_eq!(after.is_video, before.is_video);
        }
    }

    #[tokio::test]
    async fn test_missing_reference_fails_immediately() {
        let api = MockApi::shared();
        let uploader = Uploader::new(api.clone(), resolver());
        let mut attachment = local_attachment("/f/a.txt", 4);
        attachment.uri = None;

        let err = uploader.upload(&[attachment], None).await.unwrap_err();
        assert!(matches!(err, UploadError::MissingReference(_)));
        assert_eq!(api.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_file_aborts_batch() {
        let api = MockApi::shared();
        let uploader = Uploader::new(api.clone(), resolver());
        let input = vec![
            local_attachment("/f/a.txt", 4),
            local_attachment("/f/missing.txt", 4),
            local_attachment("/f/c.mp4", 4),
        ];

        let err = uploader.upload(&input, None).await.unwrap_err();
        assert!(matches!(err, UploadError::Unresolvable(_)));
        assert_eq!(api.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_fails() {
        let api = MockApi::shared();
        api.reply(UPLOAD, Reply::Status(413, "Payload Too Large"));
        let uploader = Uploader::new(api.clone(), resolver());

        let err = uploader.upload(&batch(), None).await.unwrap_err();
        match err {
            UploadError::Rejected { name, message } => {
                assert_eq!(name, "a.txt");
                assert_eq!(message, "Payload Too Large");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_upload_response_fails() {
        let api = MockApi::shared();
        api.reply(UPLOAD, Reply::Ok("not json".into()));
        let uploader = Uploader::new(api.clone(), resolver());

        let err = uploader.upload(&batch(), None).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_fails() {
        let api = MockApi::shared();
        api.reply(UPLOAD, Reply::Offline);
        let uploader = Uploader::new(api.clone(), resolver());

        let err = uploader.upload(&batch(), None).await.unwrap_err();
        assert!(matches!(err, UploadError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_between_files() {
        for cancel_after in 1..=3usize {
            let api = MockApi::shared();
            let hooks = UploadFileHooks::shared();
            let observer_hooks = hooks.clone();
            api.on_upload(move |count| {
                if count == cancel_after {
                    observer_hooks.cancel();
                }
            });
            let uploader = Uploader::new(api.clone(), resolver());
            let shared: SharedHooks = hooks.clone();

            let err = uploader.upload(&batch(), Some(&shared)).await.unwrap_err();

            assert!(matches!(err, UploadError::Cancelled));
            assert_eq!(api.upload_count(), cancel_after);
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_uploads_nothing() {
        let api = MockApi::shared();
        let hooks: SharedHooks = UploadFileHooks::shared();
        hooks.cancel();
        let uploader = Uploader::new(api.clone(), resolver());

        let err = uploader.upload(&batch(), Some(&hooks)).await.unwrap_err();
        assert!(matches!(err, UploadError::Cancelled));
        assert_eq!(api.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_progress_reaches_one() {
        let api = MockApi::shared();
        let hooks = UploadFileHooks::shared();
        let shared: SharedHooks = hooks.clone();
        let uploader = Uploader::new(api, resolver());

        uploader.upload(&batch(), Some(&shared)).await.unwrap();
        assert_eq!(hooks.progress(), 1.0);
    }

    #[test]
    fn test_cancellation_maps_to_dedicated_error() {
        let err: ResponseError = UploadError::Cancelled.into();
        assert!(err.is_cancelled());
        let err: ResponseError = UploadError::Unresolvable("x".into()).into();
        assert!(matches!(err, ResponseError::ApiCallError(_)));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_batch_fraction_without_sizes() {
        assert_eq!(batch_fraction(0, 0, 1, 4), 0.25);
        assert_eq!(batch_fraction(5, 10, 1, 4), 0.5);
        assert_eq!(batch_fraction(0, 0, 0, 0), 1.0);
    }
}
