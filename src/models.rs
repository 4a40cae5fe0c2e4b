//! Core data models shared by the client components.
//!
//! [`DocumentHandle`]s flow from listing/upload into the poller and QA
//! session; [`DisplayBlock`]s and [`Turn`]s flow out to the renderer.

use serde::Serialize;

use crate::error::{ClientError, ClientResult};
use crate::identity;

/// Coarse document type, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Image,
    Unknown,
}

impl DocumentKind {
    /// Classify a file name or URL path by its last extension.
    pub fn from_file_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return DocumentKind::Unknown,
        };
        match ext.as_str() {
            "pdf" => DocumentKind::Pdf,
            "doc" | "docx" => DocumentKind::Docx,
            "jpg" | "jpeg" | "png" | "gif" => DocumentKind::Image,
            _ => DocumentKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Image => "image",
            DocumentKind::Unknown => "unknown",
        }
    }
}

/// Backend-facing identity of a document.
///
/// The two variants record which naming rule produced the pair; endpoints
/// key on `id`, the summary endpoint additionally on `normalized_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Identity {
    /// Freshly uploaded: id taken from the storage key.
    Uploaded { id: String, normalized_name: String },
    /// Previously stored: id and name parsed from the object URL.
    Stored { id: String, normalized_name: String },
}

impl Identity {
    pub fn id(&self) -> &str {
        match self {
            Identity::Uploaded { id, .. } | Identity::Stored { id, .. } => id,
        }
    }

    pub fn normalized_name(&self) -> &str {
        match self {
            Identity::Uploaded {
                normalized_name, ..
            }
            | Identity::Stored {
                normalized_name, ..
            } => normalized_name,
        }
    }
}

/// Client-side record of one document, listed or uploaded.
///
/// The backend identity is resolved once at construction and cached.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentHandle {
    id: String,
    name: String,
    url: String,
    kind: DocumentKind,
    source_identifier: Option<String>,
    just_uploaded: bool,
    #[serde(skip)]
    identity: Option<Identity>,
}

impl DocumentHandle {
    /// Handle for a document that was just uploaded.
    pub fn uploaded(name: &str, url: &str, source_identifier: &str) -> Self {
        let mut handle = Self {
            id: source_identifier.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            kind: DocumentKind::from_file_name(name),
            source_identifier: Some(source_identifier.to_string()),
            just_uploaded: true,
            identity: None,
        };
        handle.identity = identity::extract_identity(&handle).ok();
        handle
    }

    /// Handle for a previously stored document, known only by its URL.
    pub fn stored(url: &str) -> Self {
        let file_segment = identity::final_segment(url);
        let mut handle = Self {
            id: String::new(),
            name: identity::display_name(file_segment),
            url: url.to_string(),
            kind: DocumentKind::from_file_name(file_segment),
            source_identifier: None,
            just_uploaded: false,
            identity: None,
        };
        match identity::extract_identity(&handle) {
            Ok(resolved) => {
                handle.id = resolved.id().to_string();
                handle.identity = Some(resolved);
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "stored document has no derivable identity");
                handle.id = uuid::Uuid::new_v4().to_string();
            }
        }
        handle
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn source_identifier(&self) -> Option<&str> {
        self.source_identifier.as_deref()
    }

    pub fn just_uploaded(&self) -> bool {
        self.just_uploaded
    }

    /// The cached backend identity, or `MissingIdentifier`.
    pub fn identity(&self) -> ClientResult<&Identity> {
        self.identity.as_ref().ok_or_else(|| {
            ClientError::MissingIdentifier(format!("cannot address document {}", self.url))
        })
    }
}

/// Author of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One classified line of a QA answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnswerLine {
    Heading { text: String },
    Numbered { marker: String, text: String },
    Bullet { text: String },
    Plain { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Lines(Vec<AnswerLine>),
}

/// One entry of a QA transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub sender: Sender,
    pub content: TurnContent,
}

impl Turn {
    pub fn user(text: &str) -> Self {
        Self {
            sender: Sender::User,
            content: TurnContent::Text(text.to_string()),
        }
    }

    pub fn bot_text(text: &str) -> Self {
        Self {
            sender: Sender::Bot,
            content: TurnContent::Text(text.to_string()),
        }
    }

    pub fn bot_lines(lines: Vec<AnswerLine>) -> Self {
        Self {
            sender: Sender::Bot,
            content: TurnContent::Lines(lines),
        }
    }
}

/// Typed output of the summary formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DisplayBlock {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Table {
        title: Option<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}
