//! Multipart body for file uploads with byte-level progress.

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use super::{ProgressCallback, TransportError};
use crate::data::attachment::media_type_of;
use crate::files::FileUploadData;

/// Form field the backend expects the file under.
const FILE_FIELD: &str = "File";

/// Build the upload form. The reader is consumed chunk by chunk while the
/// request is sent, and `progress` receives the running byte count.
pub(super) fn upload_form(
    file: FileUploadData,
    progress: Option<ProgressCallback>,
) -> Result<Form, TransportError> {
    let FileUploadData {
        file_name,
        bytes_size,
        content,
    } = file;

    let body = Body::wrap_stream(progress_stream(content, progress));
    let part = match bytes_size {
        Some(len) => Part::stream_with_length(body, len),
        None => Part::stream(body),
    };
    let mime = media_type_of(&file_name);
    let part = part.file_name(file_name).mime_str(mime.essence_str())?;

    Ok(Form::new().part(FILE_FIELD, part))
}

fn progress_stream<R>(
    reader: R,
    progress: Option<ProgressCallback>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static
where
    R: AsyncRead + Send + Sync + Unpin + 'static,
{
    let mut sent = 0u64;
    ReaderStream::new(reader).inspect_ok(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(cb) = &progress {
            cb(sent);
        }
    })
}
