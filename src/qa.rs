//! Question-and-answer sessions against one document.
//!
//! A [`QaSession`] owns the transcript for a single document. Each call to
//! [`QaSession::ask`] appends the user's turn immediately, issues one
//! request, and appends exactly one bot turn: the classified answer or a
//! fixed fallback text. `ask` never fails; errors become bot turns.
//!
//! Sessions are cheap to clone and share their transcript, so overlapping
//! questions are allowed. Their replies land in completion order.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::SummarizerApi;
use crate::format::classify_answer;
use crate::models::{DocumentHandle, Turn};

/// Bot reply when the backend returned no answer.
pub const NO_ANSWER: &str = "Sorry, I could not find an answer.";

/// Bot reply for any failure (identity, transport, malformed response).
pub const CHATBOT_ERROR: &str = "Sorry, there was an error with the chatbot.";

#[derive(Clone)]
pub struct QaSession {
    api: Arc<dyn SummarizerApi>,
    document: DocumentHandle,
    transcript: Arc<Mutex<Vec<Turn>>>,
}

impl QaSession {
    /// Start an empty transcript for `document`.
    pub fn new(api: Arc<dyn SummarizerApi>, document: DocumentHandle) -> Self {
        Self {
            api,
            document,
            transcript: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn document(&self) -> &DocumentHandle {
        &self.document
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<Turn> {
        self.transcript.lock().clone()
    }

    /// Ask `question` and return the transcript after the reply.
    ///
    /// Blank questions are ignored.
    pub async fn ask(&self, question: &str) -> Vec<Turn> {
        if question.trim().is_empty() {
            return self.transcript();
        }

        self.transcript.lock().push(Turn::user(question));
        let reply = self.answer(question).await;
        self.transcript.lock().push(reply);

        self.transcript()
    }

    async fn answer(&self, question: &str) -> Turn {
        let identity = match self.document.identity() {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(document = self.document.name(), error = %e, "cannot ask about document");
                return Turn::bot_text(CHATBOT_ERROR);
            }
        };

        tracing::debug!(id = identity.id(), question, "asking");
        match self.api.ask(identity, question).await {
            Ok(Some(answer)) => {
                let lines = classify_answer(&answer);
                if lines.is_empty() {
                    Turn::bot_text(NO_ANSWER)
                } else {
                    Turn::bot_lines(lines)
                }
            }
            Ok(None) => Turn::bot_text(NO_ANSWER),
            Err(e) => {
                tracing::warn!(id = identity.id(), error = %e, "error fetching chatbot response");
                Turn::bot_text(CHATBOT_ERROR)
            }
        }
    }
}
