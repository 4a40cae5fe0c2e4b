//! # RFP Summarizer
//!
//! Client for a document summarization service: upload RFP/EOI documents,
//! poll for their generated summaries, and ask questions about them.
//!
//! Authentication is delegated to an external identity provider and all
//! summarization/QA work to a remote HTTP API. This crate owns the client
//! side: session handling, the document collection, upload orchestration,
//! summary polling, and formatting of the semi-structured summary text.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────────┐   ┌─────────────┐   ┌───────────┐
//! │  Upload   │──▶│ DocumentHandle │──▶│ Poller / QA │──▶│ Formatter │──▶ render
//! │  Listing  │   │   (identity)   │   │    (API)    │   │  (blocks) │
//! └───────────┘   └────────────────┘   └─────────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rfpsum login "https://summarizer.example.com/?token=eyJ..."
//! rfpsum upload ./Tender.pdf --summarize
//! rfpsum list
//! rfpsum summary 2
//! rfpsum ask 2 "What is the bid submission deadline?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`identity`] | Backend identity derivation |
//! | [`api`] | Backend HTTP client |
//! | [`upload`] | Upload orchestration |
//! | [`poller`] | Summary polling |
//! | [`qa`] | Question-and-answer sessions |
//! | [`format`] | Summary and answer formatting |
//! | [`dashboard`] | Document collection and selection |
//! | [`auth`] | Token validation |
//! | [`session`] | Signed-in session context |
//! | [`render`] | Terminal rendering |
//! | [`progress`] | Polling progress reporting |
//! | [`error`] | Client error taxonomy |
//! | [`logging`] | Tracing subscriber setup |

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod identity;
pub mod logging;
pub mod models;
pub mod poller;
pub mod progress;
pub mod qa;
pub mod render;
pub mod session;
pub mod upload;
