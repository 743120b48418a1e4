//! Resolution of local file references into readable streams.
//!
//! The resolver hands out an owned reader per upload; dropping the
//! [`FileUploadData`] closes the underlying handle on every exit path.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::data::{FileData, FileUri};

/// An opened file ready to be streamed to the server.
pub struct FileUploadData {
    pub file_name: String,
    /// Total length, when known up front. Used for progress reporting.
    pub bytes_size: Option<u64>,
    pub content: Box<dyn AsyncRead + Send + Sync + Unpin>,
}

impl std::fmt::Debug for FileUploadData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUploadData")
            .field("file_name", &self.file_name)
            .field("bytes_size", &self.bytes_size)
            .finish_non_exhaustive()
    }
}

/// Turns [`FileUri`]s into upload streams and display metadata.
#[async_trait]
pub trait FileResolver: Send + Sync {
    /// Open the file for uploading. `None` if it cannot be found or read.
    async fn resolve_for_upload(&self, uri: &FileUri) -> Option<FileUploadData>;

    /// Metadata of the file, `None` if it cannot be found.
    async fn file_data(&self, uri: &FileUri) -> Option<FileData>;

    /// Whether the file behind `uri` is still present on this device.
    async fn exists(&self, uri: &FileUri) -> bool {
        self.file_data(uri).await.is_some()
    }
}

/// Resolver for files on the local filesystem.
///
/// Only bare paths and `file://` URIs are understood; anything else resolves
/// to `None`.
#[derive(Debug, Default, Clone)]
pub struct LocalFileResolver;

impl LocalFileResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileResolver for LocalFileResolver {
    async fn resolve_for_upload(&self, uri: &FileUri) -> Option<FileUploadData> {
        let data = self.file_data(uri).await?;
        let path = uri.to_path()?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Some(FileUploadData {
                file_name: data.name,
                bytes_size: Some(data.bytes_size),
                content: Box::new(file),
            }),
            Err(e) => {
                log::warn!("Failed to open {} for upload: {}", path.display(), e);
                None
            }
        }
    }

    async fn file_data(&self, uri: &FileUri) -> Option<FileData> {
        let path = uri.to_path()?;
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        if !metadata.is_file() {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().to_string();
        Some(FileData {
            name,
            bytes_size: metadata.len(),
            uri: uri.clone(),
            is_local: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_resolves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, b"hello").unwrap();

        let resolver = LocalFileResolver::new();
        let uri = FileUri::from_path(&path);

        let data = resolver.file_data(&uri).await.unwrap();
        assert_eq!(data.name, "report.txt");
        assert_eq!(data.bytes_size, 5);

        let mut upload = resolver.resolve_for_upload(&uri).await.unwrap();
        assert_eq!(upload.file_name, "report.txt");
        assert_eq!(upload.bytes_size, Some(5));
        let mut content = Vec::new();
        upload.content.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, b"hello");
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let uri = FileUri::from_path(&dir.path().join("gone.png"));
        let resolver = LocalFileResolver::new();

        assert!(resolver.resolve_for_upload(&uri).await.is_none());
        assert!(resolver.file_data(&uri).await.is_none());
        assert!(!resolver.exists(&uri).await);
    }

    #[tokio::test]
    async fn test_directory_and_foreign_scheme_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = LocalFileResolver::new();

        assert!(resolver.file_data(&FileUri::from_path(dir.path())).await.is_none());
        assert!(resolver
            .file_data(&FileUri::new("content://media/external/1"))
            .await
            .is_none());
    }
}
