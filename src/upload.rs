//! Upload orchestration.
//!
//! Uploading is a two-step exchange with the backend:
//!
//! 1. `POST /upload` with the file name and user email returns a pre-signed
//!    URL and a storage key `<prefix>/<user>/<unique_id>_<file name>`.
//! 2. The raw bytes are `PUT` directly to the pre-signed URL.
//!
//! The resulting [`DocumentHandle`] carries the `unique_id` from the storage
//! key and is flagged as just uploaded so the summary poller applies its
//! grace delay. A storage key that does not yield an id fails the upload.

use std::path::Path;

use crate::api::SummarizerApi;
use crate::error::{ClientError, ClientResult};
use crate::models::DocumentHandle;

/// A local file ready to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ClientError::UploadFailed(format!("not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::UploadFailed(format!("cannot read {}: {}", path.display(), e))
        })?;
        let content_type = content_type_for(&name);
        Ok(Self::new(&name, content_type, bytes))
    }
}

/// MIME type for a file name, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Upload `file` on behalf of `user_email` and return its handle.
pub async fn upload(
    api: &dyn SummarizerApi,
    user_email: &str,
    file: UploadFile,
) -> ClientResult<DocumentHandle> {
    tracing::info!(file = %file.name, size = file.bytes.len(), "requesting upload destination");
    let target = api.request_upload(&file.name, user_email).await?;

    // Parse the key before transferring so a bad key never leaves an orphan upload.
    let source_identifier = source_identifier_from_key(&target.unique_key)?;

    api.put_object(&target.presigned_url, &file.content_type, file.bytes)
        .await?;

    let url = target
        .presigned_url
        .split('?')
        .next()
        .unwrap_or(&target.presigned_url);

    tracing::info!(file = %file.name, id = %source_identifier, "upload complete");
    Ok(DocumentHandle::uploaded(&file.name, url, &source_identifier))
}

/// `unique_id` from a storage key `<prefix>/<user>/<unique_id>_<name>`.
pub fn source_identifier_from_key(key: &str) -> ClientResult<String> {
    let component = key.split('/').nth(2).ok_or_else(|| {
        ClientError::UploadFailed(format!("storage key has too few components: {}", key))
    })?;
    match component.split_once('_') {
        Some((id, _)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ClientError::UploadFailed(format!(
            "storage key has no unique id: {}",
            key
        ))),
    }
}
