//! Backend API client.
//!
//! Defines the [`SummarizerApi`] trait, the seam between the client core
//! and the remote summarization service, and [`HttpApi`], its `reqwest`
//! implementation.
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET` | `/documents?email=` | List stored document URLs |
//! | `POST` | `/upload` | Obtain a pre-signed upload URL and storage key |
//! | `PUT` | *pre-signed URL* | Direct upload of the file bytes |
//! | `GET` | `/summarize?unique_id=&file_name=` | Fetch a generated summary |
//! | `POST` | `/querychatbot?unique_id=&query=` | Ask a question |
//!
//! # Response envelope
//!
//! The backend sits behind a non-proxy API gateway integration, so every
//! JSON response is wrapped as `{"statusCode": 200, "body": "<json>"}` with
//! the payload serialized into the `body` string. [`unwrap_body`] undoes
//! that wrapping.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::Identity;

/// Write destination returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Pre-signed URL accepting a `PUT` of the raw bytes.
    pub presigned_url: String,
    /// Opaque storage key, `<prefix>/<user>/<unique_id>_<file name>`.
    pub unique_key: String,
}

/// Outcome of one summary query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryStatus {
    /// Summary text is available.
    Ready(String),
    /// The backend answered but the summary is not generated yet.
    Pending,
    /// The response lacked the expected envelope.
    Malformed,
}

/// Remote summarization service.
///
/// Implemented by [`HttpApi`] for the real backend and by in-memory mocks
/// in tests.
#[async_trait]
pub trait SummarizerApi: Send + Sync {
    /// URLs of every document stored for `user`.
    async fn list_documents(&self, user: &str) -> ClientResult<Vec<String>>;

    /// Ask for a write destination for `file_name`.
    async fn request_upload(&self, file_name: &str, user: &str) -> ClientResult<UploadTarget>;

    /// Transfer raw bytes to a pre-signed destination.
    async fn put_object(&self, url: &str, content_type: &str, bytes: Vec<u8>) -> ClientResult<()>;

    /// Query the summary endpoint once.
    async fn fetch_summary(&self, identity: &Identity) -> ClientResult<SummaryStatus>;

    /// Ask a question about a document. `Ok(None)` when no answer was given.
    async fn ask(&self, identity: &Identity, question: &str) -> ClientResult<Option<String>>;
}

/// `reqwest`-backed [`SummarizerApi`].
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    document_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    presigned_url: Option<String>,
    unique_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    #[serde(default)]
    answer: Option<String>,
}

impl HttpApi {
    /// Build a client for the configured base URL.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> ClientResult<Value> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        parse_json(&response.text().await?)
    }

    async fn post_json(&self, url: &str, body: Option<&Value>) -> ClientResult<Value> {
        tracing::debug!(url, "POST");
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?.error_for_status()?;
        parse_json(&response.text().await?)
    }
}

/// A response that arrived but is not JSON is malformed, not a transport failure.
fn parse_json(text: &str) -> ClientResult<Value> {
    serde_json::from_str(text)
        .map_err(|e| ClientError::MalformedResponse(format!("response is not JSON: {}", e)))
}

#[async_trait]
impl SummarizerApi for HttpApi {
    async fn list_documents(&self, user: &str) -> ClientResult<Vec<String>> {
        let url = format!(
            "{}/documents?email={}",
            self.base_url,
            urlencoding::encode(user)
        );
        let envelope = self.get_json(&url).await?;
        let body = unwrap_body(&envelope)?
            .ok_or_else(|| ClientError::MalformedResponse("listing has no body".to_string()))?;
        let list: DocumentList = serde_json::from_value(body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        list.document_urls.ok_or_else(|| {
            ClientError::MalformedResponse("listing has no document_urls".to_string())
        })
    }

    async fn request_upload(&self, file_name: &str, user: &str) -> ClientResult<UploadTarget> {
        let url = format!("{}/upload", self.base_url);
        let request = serde_json::json!({
            "file_name": file_name,
            "user_email": user,
        });
        let envelope = self
            .post_json(&url, Some(&request))
            .await
            .map_err(|e| ClientError::UploadFailed(format!("upload request: {}", e)))?;

        let body = unwrap_body(&envelope)
            .map_err(|e| ClientError::UploadFailed(e.to_string()))?
            .ok_or_else(|| ClientError::UploadFailed("upload response has no body".to_string()))?;
        let parsed: UploadBody = serde_json::from_value(body)
            .map_err(|e| ClientError::UploadFailed(format!("upload response: {}", e)))?;

        match (parsed.presigned_url, parsed.unique_key) {
            (Some(presigned_url), Some(unique_key))
                if !presigned_url.is_empty() && !unique_key.is_empty() =>
            {
                Ok(UploadTarget {
                    presigned_url,
                    unique_key,
                })
            }
            _ => Err(ClientError::UploadFailed(
                "upload response is missing presigned_url or unique_key".to_string(),
            )),
        }
    }

    async fn put_object(&self, url: &str, content_type: &str, bytes: Vec<u8>) -> ClientResult<()> {
        tracing::debug!(content_type, size = bytes.len(), "PUT pre-signed object");
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClientError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::UploadFailed(format!(
                "storage rejected upload ({}): {}",
                status, text
            )));
        }
        Ok(())
    }

    async fn fetch_summary(&self, identity: &Identity) -> ClientResult<SummaryStatus> {
        let url = format!(
            "{}/summarize?unique_id={}&file_name={}",
            self.base_url,
            urlencoding::encode(identity.id()),
            identity.normalized_name()
        );
        let envelope = match self.get_json(&url).await {
            Ok(envelope) => envelope,
            Err(ClientError::MalformedResponse(reason)) => {
                tracing::debug!(%reason, "summary response is not JSON");
                return Ok(SummaryStatus::Malformed);
            }
            Err(e) => return Err(e),
        };
        Ok(summary_status(&envelope))
    }

    async fn ask(&self, identity: &Identity, question: &str) -> ClientResult<Option<String>> {
        let url = format!(
            "{}/querychatbot?unique_id={}&query={}",
            self.base_url,
            urlencoding::encode(identity.id()),
            urlencoding::encode(question)
        );
        let envelope = self.post_json(&url, None).await?;
        let body = unwrap_body(&envelope)?
            .ok_or_else(|| ClientError::MalformedResponse("answer has no body".to_string()))?;
        let parsed: AnswerBody = serde_json::from_value(body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        Ok(parsed.answer.filter(|answer| !answer.is_empty()))
    }
}

/// Classify a summary envelope. Any decode or shape failure is `Malformed`.
fn summary_status(envelope: &Value) -> SummaryStatus {
    let parsed = unwrap_body(envelope)
        .ok()
        .flatten()
        .and_then(|body| serde_json::from_value::<SummaryBody>(body).ok());
    match parsed {
        None => SummaryStatus::Malformed,
        Some(SummaryBody {
            summary: Some(summary),
        }) if !summary.is_empty() => SummaryStatus::Ready(summary),
        Some(_) => SummaryStatus::Pending,
    }
}

/// Extract the payload from a gateway envelope.
///
/// Returns `Ok(None)` when there is no (or an empty) `body` field, the
/// parsed payload when `body` is a JSON string, and the value itself when
/// `body` is already an object.
pub fn unwrap_body(envelope: &Value) -> ClientResult<Option<Value>> {
    match envelope.get("body") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| ClientError::MalformedResponse(format!("body is not JSON: {}", e))),
        Some(other) => Ok(Some(other.clone())),
    }
}
