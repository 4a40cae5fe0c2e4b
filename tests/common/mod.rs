//! In-memory `SummarizerApi` shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use rfp_summarizer::api::{SummarizerApi, SummaryStatus, UploadTarget};
use rfp_summarizer::config::PollingConfig;
use rfp_summarizer::error::{ClientError, ClientResult};
use rfp_summarizer::models::Identity;

/// URL of a stored document whose identity is `abc123` / `Tender%20Doc`.
pub const STORED_URL: &str = "https://bucket.s3.amazonaws.com/uploads/jane/abc123_Tender Doc.pdf";

#[derive(Default)]
pub struct MockApi {
    pub documents: Mutex<Vec<String>>,
    pub upload_target: Mutex<Option<UploadTarget>>,
    pub put_error: Mutex<Option<String>>,
    pub summaries: Mutex<VecDeque<ClientResult<SummaryStatus>>>,
    pub answers: Mutex<VecDeque<ClientResult<Option<String>>>>,
    /// When set, `ask` waits for a notification before answering.
    pub ask_gate: Option<Arc<Notify>>,

    pub puts: Mutex<Vec<(String, String, usize)>>,
    pub summary_calls: AtomicUsize,
    pub ask_calls: AtomicUsize,
    pub asked: Mutex<Vec<(String, String)>>,
}

impl MockApi {
    pub fn with_summaries(statuses: Vec<ClientResult<SummaryStatus>>) -> Self {
        Self {
            summaries: Mutex::new(statuses.into()),
            ..Default::default()
        }
    }

    pub fn with_answers(answers: Vec<ClientResult<Option<String>>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    pub fn with_documents(urls: &[&str]) -> Self {
        Self {
            documents: Mutex::new(urls.iter().map(|u| u.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummarizerApi for MockApi {
    async fn list_documents(&self, _user: &str) -> ClientResult<Vec<String>> {
        Ok(self.documents.lock().clone())
    }

    async fn request_upload(&self, _file_name: &str, _user: &str) -> ClientResult<UploadTarget> {
        self.upload_target
            .lock()
            .clone()
            .ok_or_else(|| ClientError::UploadFailed("no upload target".to_string()))
    }

    async fn put_object(&self, url: &str, content_type: &str, bytes: Vec<u8>) -> ClientResult<()> {
        if let Some(reason) = self.put_error.lock().clone() {
            return Err(ClientError::UploadFailed(reason));
        }
        self.puts
            .lock()
            .push((url.to_string(), content_type.to_string(), bytes.len()));
        Ok(())
    }

    async fn fetch_summary(&self, _identity: &Identity) -> ClientResult<SummaryStatus> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.summaries
            .lock()
            .pop_front()
            .unwrap_or(Ok(SummaryStatus::Pending))
    }

    async fn ask(&self, identity: &Identity, question: &str) -> ClientResult<Option<String>> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        self.asked
            .lock()
            .push((identity.id().to_string(), question.to_string()));
        if let Some(gate) = &self.ask_gate {
            gate.notified().await;
        }
        self.answers.lock().pop_front().unwrap_or(Ok(None))
    }
}

pub fn polling(grace_delay_secs: u64, retry_interval_secs: u64, max_attempts: u32) -> PollingConfig {
    PollingConfig {
        grace_delay_secs,
        retry_interval_secs,
        max_attempts,
    }
}
