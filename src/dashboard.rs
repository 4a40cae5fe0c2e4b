//! In-memory document workspace.
//!
//! [`Dashboard`] holds the user's document collection, the current
//! selection, the latest summary, and the open QA session. Summary and QA
//! requests are tagged with a [`RequestTicket`]; selecting another document
//! advances the selection epoch so results for an earlier selection are
//! discarded instead of overwriting fresher state.

use std::collections::HashSet;
use std::sync::Arc;

use crate::api::SummarizerApi;
use crate::error::ClientResult;
use crate::models::DocumentHandle;
use crate::qa::QaSession;
use crate::upload::{self, UploadFile};

/// Identifies the selection a request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    document_id: String,
    epoch: u64,
}

impl RequestTicket {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

pub struct Dashboard {
    api: Arc<dyn SummarizerApi>,
    documents: Vec<DocumentHandle>,
    selected: Option<String>,
    epoch: u64,
    summary: Option<String>,
    qa: Option<QaSession>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn SummarizerApi>) -> Self {
        Self {
            api,
            documents: Vec::new(),
            selected: None,
            epoch: 0,
            summary: None,
            qa: None,
        }
    }

    /// Replace the collection with the documents stored for `user_email`.
    ///
    /// Documents uploaded in this session are kept, and their entries in the
    /// listing are skipped. Returns the number of stored documents added.
    pub async fn load_documents(&mut self, user_email: &str) -> ClientResult<usize> {
        let urls = self.api.list_documents(user_email).await?;
        tracing::debug!(count = urls.len(), "fetched document urls");

        self.documents.retain(|doc| doc.source_identifier().is_some());
        let uploaded: HashSet<String> = self
            .documents
            .iter()
            .map(|doc| doc.id().to_string())
            .collect();

        let before = self.documents.len();
        self.documents.extend(
            urls.iter()
                .map(|url| DocumentHandle::stored(url))
                .filter(|doc| !uploaded.contains(doc.id())),
        );
        Ok(self.documents.len() - before)
    }

    /// Upload a file and append the resulting handle.
    pub async fn upload(&mut self, user_email: &str, file: UploadFile) -> ClientResult<&DocumentHandle> {
        let handle = upload::upload(self.api.as_ref(), user_email, file).await?;
        self.documents.push(handle);
        let index = self.documents.len() - 1;
        Ok(&self.documents[index])
    }

    pub fn documents(&self) -> &[DocumentHandle] {
        &self.documents
    }

    /// Documents uploaded during this session.
    pub fn newly_uploaded(&self) -> impl Iterator<Item = &DocumentHandle> {
        self.documents
            .iter()
            .filter(|doc| doc.source_identifier().is_some())
    }

    /// Documents known from the listing endpoint.
    pub fn previously_uploaded(&self) -> impl Iterator<Item = &DocumentHandle> {
        self.documents
            .iter()
            .filter(|doc| doc.source_identifier().is_none())
    }

    /// Find a document by id, exact name, or 1-based position.
    pub fn find(&self, key: &str) -> Option<&DocumentHandle> {
        self.documents
            .iter()
            .find(|doc| doc.id() == key)
            .or_else(|| self.documents.iter().find(|doc| doc.name() == key))
            .or_else(|| {
                key.parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .and_then(|n| self.documents.get(n - 1))
            })
    }

    /// Select a document. Clears the summary and invalidates pending requests.
    pub fn select(&mut self, key: &str) -> Option<&DocumentHandle> {
        let id = self.find(key)?.id().to_string();

        if self.selected.as_deref() != Some(id.as_str()) {
            self.epoch += 1;
            self.summary = None;
            if self
                .qa
                .as_ref()
                .is_some_and(|qa| qa.document().id() != id)
            {
                self.qa = None;
            }
            self.selected = Some(id);
        }
        self.selected()
    }

    pub fn selected(&self) -> Option<&DocumentHandle> {
        let id = self.selected.as_deref()?;
        self.documents.iter().find(|doc| doc.id() == id)
    }

    /// Ticket for a request about the current selection.
    pub fn begin_request(&self) -> Option<RequestTicket> {
        self.selected.as_ref().map(|id| RequestTicket {
            document_id: id.clone(),
            epoch: self.epoch,
        })
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.epoch == self.epoch && self.selected.as_deref() == Some(ticket.document_id.as_str())
    }

    /// Store a summary if its ticket is still current. Returns whether it was kept.
    pub fn apply_summary(&mut self, ticket: &RequestTicket, summary: String) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(document = ticket.document_id(), "discarding stale summary");
            return false;
        }
        self.summary = Some(summary);
        true
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// QA session for the selected document, created on first use.
    pub fn open_qa(&mut self) -> Option<QaSession> {
        let document = self.selected()?.clone();
        if self
            .qa
            .as_ref()
            .map_or(true, |qa| qa.document().id() != document.id())
        {
            self.qa = Some(QaSession::new(Arc::clone(&self.api), document));
        }
        self.qa.clone()
    }

    /// Close the QA session; reopening starts a fresh transcript.
    pub fn close_qa(&mut self) {
        self.qa = None;
    }
}
