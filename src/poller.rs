//! Summary polling.
//!
//! Summaries are produced asynchronously after upload. [`SummaryPoller`]
//! queries the summary endpoint until text is available:
//!
//! 1. Resolve the handle's identity (fails with `MissingIdentifier`).
//! 2. For a just-uploaded handle, wait the grace delay once per handle.
//! 3. Query; on an empty summary sleep the retry interval and query again.
//!
//! Polling is bounded by `max_attempts`; exhausting it yields
//! [`ClientError::Timeout`]. A malformed response (no gateway envelope, a
//! body that is not JSON, or a payload of the wrong shape) ends polling with
//! the [`UNEXPECTED_FORMAT`] sentinel text.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::api::{SummarizerApi, SummaryStatus};
use crate::config::PollingConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::DocumentHandle;
use crate::progress::{NoProgress, PollProgressEvent, PollProgressReporter};

/// Returned in place of a summary when the backend response is malformed.
pub const UNEXPECTED_FORMAT: &str = "Unexpected response format.";

pub struct SummaryPoller {
    api: Arc<dyn SummarizerApi>,
    grace_delay: Duration,
    retry_interval: Duration,
    max_attempts: Option<u32>,
    /// Handle ids whose grace delay has already been spent.
    graced: Mutex<HashSet<String>>,
    reporter: Box<dyn PollProgressReporter>,
}

impl SummaryPoller {
    pub fn new(api: Arc<dyn SummarizerApi>, config: &PollingConfig) -> Self {
        Self {
            api,
            grace_delay: config.grace_delay(),
            retry_interval: config.retry_interval(),
            max_attempts: config.attempt_limit(),
            graced: Mutex::new(HashSet::new()),
            reporter: Box::new(NoProgress),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn PollProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Poll until the summary for `handle` is available.
    pub async fn fetch_summary(&self, handle: &DocumentHandle) -> ClientResult<String> {
        let identity = handle.identity()?;

        if handle.just_uploaded() && self.mark_graced(handle.id()) {
            tracing::info!(
                document = handle.name(),
                secs = self.grace_delay.as_secs(),
                "newly uploaded document, waiting before first summary query"
            );
            self.reporter.report(PollProgressEvent::GraceDelay {
                document: handle.name().to_string(),
                secs: self.grace_delay.as_secs(),
            });
            tokio::time::sleep(self.grace_delay).await;
        }

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let status = match self.api.fetch_summary(identity).await {
                Err(ClientError::MalformedResponse(reason)) => {
                    tracing::debug!(%reason, "malformed summary response");
                    SummaryStatus::Malformed
                }
                other => other?,
            };
            match status {
                SummaryStatus::Ready(summary) => {
                    tracing::debug!(document = handle.name(), attempts, "summary ready");
                    self.reporter.report(PollProgressEvent::Ready {
                        document: handle.name().to_string(),
                        attempts,
                    });
                    return Ok(summary);
                }
                SummaryStatus::Malformed => {
                    tracing::warn!(document = handle.name(), "unexpected summary response format");
                    return Ok(UNEXPECTED_FORMAT.to_string());
                }
                SummaryStatus::Pending => {
                    if self.max_attempts.is_some_and(|limit| attempts >= limit) {
                        tracing::warn!(document = handle.name(), attempts, "giving up on summary");
                        return Err(ClientError::Timeout { attempts });
                    }
                    tracing::debug!(document = handle.name(), attempts, "summary not found, will retry");
                    self.reporter.report(PollProgressEvent::Waiting {
                        document: handle.name().to_string(),
                        attempt: attempts,
                        retry_in_secs: self.retry_interval.as_secs(),
                    });
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    /// Record that the grace delay is being applied; `false` if it already was.
    fn mark_graced(&self, handle_id: &str) -> bool {
        self.graced.lock().insert(handle_id.to_string())
    }
}
