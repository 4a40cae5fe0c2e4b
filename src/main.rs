//! # RFP Summarizer CLI (`rfpsum`)
//!
//! Upload documents, fetch their generated summaries, and ask questions
//! about them from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! rfpsum --config ./config/rfpsum.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rfpsum login <url-or-token>` | Validate a sign-in token and save the session |
//! | `rfpsum logout` | Remove the saved session |
//! | `rfpsum whoami` | Show the signed-in user |
//! | `rfpsum list` | List newly and previously uploaded documents |
//! | `rfpsum upload <path>` | Upload a document (optionally summarize it) |
//! | `rfpsum summary <doc>` | Poll for and print a document's summary |
//! | `rfpsum ask <doc> "<question>"` | Ask one question about a document |
//! | `rfpsum chat <doc>` | Interactive question-and-answer session |
//! | `rfpsum format [file]` | Format summary text offline |
//!
//! `<doc>` is a document id, its exact name, or its position in `rfpsum list`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use rfp_summarizer::api::{HttpApi, SummarizerApi};
use rfp_summarizer::auth;
use rfp_summarizer::config::{self, Config};
use rfp_summarizer::dashboard::Dashboard;
use rfp_summarizer::error::ClientError;
use rfp_summarizer::format::format_summary;
use rfp_summarizer::logging;
use rfp_summarizer::poller::SummaryPoller;
use rfp_summarizer::progress::ProgressMode;
use rfp_summarizer::qa::QaSession;
use rfp_summarizer::render;
use rfp_summarizer::session::{self, Session};
use rfp_summarizer::upload::UploadFile;

/// Shown when a summary request fails in transport.
const SUMMARY_FAILED: &str = "Failed to fetch summary.";

/// RFP Summarizer CLI: upload, summarize, and question RFP/EOI documents.
///
/// All commands except `format` read a TOML configuration file given by
/// `--config`.
#[derive(Parser)]
#[command(
    name = "rfpsum",
    about = "RFP Summarizer: upload, summarize, and question RFP/EOI documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rfpsum.toml")]
    config: PathBuf,

    /// Bearer token to use instead of the saved session.
    #[arg(long, global = true, env = "RFPSUM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Progress on stderr while polling: `auto`, `off`, `human`, or `json`.
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a sign-in token and save the session.
    ///
    /// Accepts the URL the identity provider redirected to (the token is
    /// read from its `token` query parameter or `access_token` fragment)
    /// or a bare token.
    Login {
        /// Redirect URL or token.
        credential: String,
    },

    /// Remove the saved session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// List documents.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Upload a document.
    Upload {
        /// Path to a PDF, DOC/DOCX, or image file.
        path: PathBuf,

        /// Wait for and print the summary after uploading.
        #[arg(long)]
        summarize: bool,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Fetch and print a document's summary.
    ///
    /// Polls the summary endpoint until the summary is generated or the
    /// configured attempt limit is reached.
    Summary {
        /// Document id, name, or list position.
        document: String,

        /// Print the unformatted summary text.
        #[arg(long)]
        raw: bool,

        /// Print formatted blocks as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask one question about a document.
    Ask {
        /// Document id, name, or list position.
        document: String,

        /// The question.
        question: String,

        /// Print the transcript as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive question-and-answer session. Type `exit` to quit.
    Chat {
        /// Document id, name, or list position.
        document: String,
    },

    /// Format summary text without contacting the backend.
    Format {
        /// Text file to format; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Print blocks as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let progress = ProgressMode::parse(&cli.progress)
        .ok_or_else(|| anyhow!("invalid --progress value: '{}'", cli.progress))?;

    // Commands that don't require config
    if let Commands::Format { file, json } = &cli.command {
        return run_format(file.as_deref(), *json).await;
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Login { credential } => {
            run_login(&cfg, &credential).await?;
        }
        Commands::Logout => {
            if Session::sign_out(&cfg.session.path)? {
                println!("Signed out.");
            } else {
                println!("No active session.");
            }
        }
        Commands::Whoami => {
            let session = require_session(&cfg, cli.token.as_deref()).await;
            println!("{}", session.user_email());
            if let Some(exp) = session.expires_at() {
                if let Some(at) = chrono::DateTime::from_timestamp(exp, 0) {
                    println!("session expires {}", at.format("%Y-%m-%dT%H:%M:%SZ"));
                }
            }
        }
        Commands::List { json } => {
            let session = require_session(&cfg, cli.token.as_deref()).await;
            let dashboard = load_dashboard(&cfg, &session).await?;
            run_list(&dashboard, json)?;
        }
        Commands::Upload {
            path,
            summarize,
            json,
        } => {
            let session = require_session(&cfg, cli.token.as_deref()).await;
            run_upload(&cfg, &session, &path, summarize, json, progress).await?;
        }
        Commands::Summary {
            document,
            raw,
            json,
        } => {
            let session = require_session(&cfg, cli.token.as_deref()).await;
            let mut dashboard = load_dashboard(&cfg, &session).await?;
            select(&mut dashboard, &document)?;
            let poller = SummaryPoller::new(http_api(&cfg)?, &cfg.polling)
                .with_reporter(progress.reporter());
            run_summary(&mut dashboard, &poller, raw, json).await?;
        }
        Commands::Ask {
            document,
            question,
            json,
        } => {
            let session = require_session(&cfg, cli.token.as_deref()).await;
            let qa = open_qa(&cfg, &session, &document).await?;
            let transcript = qa.ask(&question).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&transcript)?);
            } else if let Some(reply) = transcript.last() {
                print!("{}", render::render_turn(reply));
            }
        }
        Commands::Chat { document } => {
            let session = require_session(&cfg, cli.token.as_deref()).await;
            let qa = open_qa(&cfg, &session, &document).await?;
            run_chat(&qa).await?;
        }
        Commands::Format { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

fn http_api(cfg: &Config) -> Result<Arc<dyn SummarizerApi>> {
    Ok(Arc::new(HttpApi::new(&cfg.api)?))
}

/// Resolve the session or send the user back to sign in.
async fn require_session(cfg: &Config, token: Option<&str>) -> Session {
    match session::resolve(&cfg.auth, &cfg.session.path, token).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            match &cfg.auth.redirect_url {
                Some(url) => eprintln!(
                    "Sign in at {} and run `rfpsum login <redirect-url>`.",
                    url
                ),
                None => eprintln!("Run `rfpsum login <redirect-url-or-token>` to sign in."),
            }
            std::process::exit(1);
        }
    }
}

async fn run_login(cfg: &Config, credential: &str) -> Result<()> {
    let token =
        auth::token_from_redirect_url(credential).unwrap_or_else(|| credential.trim().to_string());

    let session = match Session::establish(&cfg.auth, &token).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    session.save(&cfg.session.path)?;
    println!("Signed in as {}.", session.user_email());
    Ok(())
}

async fn load_dashboard(cfg: &Config, session: &Session) -> Result<Dashboard> {
    let mut dashboard = Dashboard::new(http_api(cfg)?);
    dashboard
        .load_documents(session.user_email())
        .await
        .context("Failed to fetch documents")?;
    Ok(dashboard)
}

fn select(dashboard: &mut Dashboard, key: &str) -> Result<()> {
    dashboard
        .select(key)
        .map(|_| ())
        .ok_or_else(|| anyhow!("no document matching '{}' (see `rfpsum list`)", key))
}

async fn open_qa(cfg: &Config, session: &Session, document: &str) -> Result<QaSession> {
    let mut dashboard = load_dashboard(cfg, session).await?;
    select(&mut dashboard, document)?;
    dashboard
        .open_qa()
        .ok_or_else(|| anyhow!("no document selected"))
}

fn run_list(dashboard: &Dashboard, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(dashboard.documents())?);
        return Ok(());
    }

    if dashboard.documents().is_empty() {
        println!("No documents.");
        return Ok(());
    }

    let mut position = 0;
    let newly: Vec<_> = dashboard.newly_uploaded().collect();
    if !newly.is_empty() {
        println!("Newly uploaded");
        for doc in newly {
            position += 1;
            println!("{}", render::render_document_line(position, doc));
        }
        println!();
    }
    println!("Previously uploaded");
    for doc in dashboard.previously_uploaded() {
        position += 1;
        println!("{}", render::render_document_line(position, doc));
    }
    Ok(())
}

async fn run_upload(
    cfg: &Config,
    session: &Session,
    path: &Path,
    summarize: bool,
    json: bool,
    progress: ProgressMode,
) -> Result<()> {
    let file = UploadFile::from_path(path).await?;
    let api = http_api(cfg)?;
    let mut dashboard = Dashboard::new(Arc::clone(&api));

    let handle = match dashboard.upload(session.user_email(), file).await {
        Ok(handle) => handle.clone(),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // With `--json`, stdout carries exactly one JSON document.
    match (json, summarize) {
        (true, false) => println!("{}", serde_json::to_string_pretty(&handle)?),
        (true, true) => eprintln!("Uploaded {} (id={}).", handle.name(), handle.id()),
        (false, _) => println!("Uploaded {} (id={}).", handle.name(), handle.id()),
    }

    if summarize {
        select(&mut dashboard, handle.id())?;
        let poller = SummaryPoller::new(api, &cfg.polling).with_reporter(progress.reporter());
        run_summary(&mut dashboard, &poller, false, json).await?;
    }
    Ok(())
}

async fn run_summary(
    dashboard: &mut Dashboard,
    poller: &SummaryPoller,
    raw: bool,
    json: bool,
) -> Result<()> {
    let ticket = dashboard
        .begin_request()
        .ok_or_else(|| anyhow!("no document selected"))?;
    let handle = dashboard
        .selected()
        .cloned()
        .ok_or_else(|| anyhow!("no document selected"))?;

    let summary = match poller.fetch_summary(&handle).await {
        Ok(summary) => summary,
        Err(ClientError::FetchFailed(reason)) => {
            tracing::warn!(%reason, "error fetching summary");
            eprintln!("{}", SUMMARY_FAILED);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !dashboard.apply_summary(&ticket, summary) {
        return Ok(());
    }
    let summary = dashboard.summary().unwrap_or_default();

    if raw {
        println!("{}", summary);
    } else if json {
        println!("{}", serde_json::to_string_pretty(&format_summary(summary))?);
    } else {
        print!("{}", render::render_blocks(&format_summary(summary)));
    }
    Ok(())
}

async fn run_chat(qa: &QaSession) -> Result<()> {
    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        println!(
            "Q & A - {}. Ask anything about the RFP/EOI; `exit` to quit.",
            qa.document().name()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("you> ");
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question == "exit" || question == "quit" {
            break;
        }
        if question.is_empty() {
            continue;
        }
        let transcript = qa.ask(question).await;
        if let Some(reply) = transcript.last() {
            println!("{}", render::render_turn(reply));
        }
    }
    Ok(())
}

async fn run_format(file: Option<&Path>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let blocks = format_summary(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
    } else {
        print!("{}", render::render_blocks(&blocks));
    }
    Ok(())
}
