//! File attachments and local file references.

use std::fmt;
use std::path::{Path, PathBuf};

use mime_guess::Mime;
use serde::{Deserialize, Serialize};

const FILE_SCHEME: &str = "file://";

/// Opaque reference to a file on this device.
///
/// Either a bare path or a `file://` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileUri(String);

impl FileUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(format!("{}{}", FILE_SCHEME, path.display()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path, if the reference has one.
    pub fn to_path(&self) -> Option<PathBuf> {
        let raw = self.0.strip_prefix(FILE_SCHEME).unwrap_or(&self.0);
        if raw.is_empty() || raw.contains("://") {
            return None;
        }
        Some(PathBuf::from(raw))
    }
}

impl fmt::Display for FileUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File metadata used to build attachments before they are uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub name: String,
    pub bytes_size: u64,
    pub uri: FileUri,
    pub is_local: bool,
}

/// A file attached to a comment or to a new ticket.
///
/// Before upload `uri` points at the local file and `guid` is empty; after a
/// successful upload `guid` holds the server identifier and `uri` is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bytes_size: u64,
    #[serde(default)]
    pub is_text: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<FileUri>,
}

impl Attachment {
    /// Attachment for a local file that still has to be uploaded.
    pub fn local(file: &FileData) -> Self {
        let mime = media_type_of(&file.name);
        Self {
            id: None,
            guid: None,
            media_type: mime.essence_str().to_string(),
            name: file.name.clone(),
            bytes_size: file.bytes_size,
            is_text: mime.type_() == mime_guess::mime::TEXT,
            is_video: mime.type_() == mime_guess::mime::VIDEO,
            uri: Some(file.uri.clone()),
        }
    }

    /// Attachment already known to the server.
    pub fn remote(guid: impl Into<String>, name: impl Into<String>, bytes_size: u64) -> Self {
        let name = name.into();
        let mime = media_type_of(&name);
        Self {
            id: None,
            guid: Some(guid.into()),
            media_type: mime.essence_str().to_string(),
            is_text: mime.type_() == mime_guess::mime::TEXT,
            is_video: mime.type_() == mime_guess::mime::VIDEO,
            name,
            bytes_size,
            uri: None,
        }
    }

    /// Copy carrying the server-issued `guid` in place of the local reference.
    pub fn into_uploaded(self, guid: String) -> Attachment {
        Attachment {
            guid: Some(guid),
            uri: None,
            ..self
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.guid.is_some()
    }
}

/// Media type guessed from the file name's extension.
pub fn media_type_of(name: &str) -> Mime {
    mime_guess::from_path(name).first_or_octet_stream()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> FileData {
        FileData {
            name: name.to_string(),
            bytes_size: 10,
            uri: FileUri::new(format!("/tmp/{}", name)),
            is_local: true,
        }
    }

    #[test]
    fn test_file_uri_paths() {
        assert_eq!(
            FileUri::new("file:///tmp/a.txt").to_path(),
            Some(PathBuf::from("/tmp/a.txt"))
        );
        assert_eq!(FileUri::new("/tmp/a.txt").to_path(), Some(PathBuf::from("/tmp/a.txt")));
        assert_eq!(FileUri::new("content://media/1").to_path(), None);
        assert_eq!(FileUri::new("").to_path(), None);
    }

    #[test]
    fn test_classification() {
        let notes = Attachment::local(&file("notes.TXT"));
        assert!(notes.is_text);
        assert!(!notes.is_video);
        assert_eq!(notes.media_type, "text/plain");

        let clip = Attachment::local(&file("clip.mp4"));
        assert!(clip.is_video);
        assert_eq!(clip.media_type, "video/mp4");

        let blob = Attachment::local(&file("blob"));
        assert!(!blob.is_text);
        assert_eq!(blob.media_type, "application/octet-stream");
    }

    #[test]
    fn test_media_type_agrees_with_video_flag() {
        for name in ["clip.mkv", "clip.avi", "clip.webm", "clip.mov"] {
            let attachment = Attachment::local(&file(name));
            assert!(attachment.is_video, "{} should be a video", name);
            assert!(
                attachment.media_type.starts_with("video/"),
                "{} got {}",
                name,
                attachment.media_type
            );
        }
    }

    #[test]
    fn test_common_document_types() {
        assert_eq!(Attachment::local(&file("song.mp3")).media_type, "audio/mpeg");
        assert_eq!(Attachment::local(&file("page.html")).media_type, "text/html");
        assert_eq!(
            Attachment::local(&file("report.docx")).media_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            Attachment::remote("g", "scan.pdf", 1).media_type,
            "application/pdf"
        );
    }

    #[test]
    fn test_into_uploaded_replaces_uri_only() {
        let local = Attachment::local(&file("shot.png"));
        let uploaded = local.clone().into_uploaded("guid-1".to_string());

        assert_eq!(uploaded.guid.as_deref(), Some("guid-1"));
        assert!(uploaded.uri.is_none());
        assert_eq!(uploaded.name, local.name);
        assert_eq!(uploaded.bytes_size, local.bytes_size);
        assert_eq!(uploaded.media_type, local.media_type);
        assert_eq!(uploaded.is_text, local.is_text);
        assert_eq!(uploaded.is_video, local.is_video);
    }
}
