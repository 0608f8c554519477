//! Tonedown CLI - Binary entry point.
//!
//! # Architecture
//!
//! The CLI is a thin harness over [`tonedown_engine`] (rewrite orchestration)
//! and [`tonedown_scan`] (live-document scanning):
//!
//! ```text
//! main() -> Settings::load() -> RewriteService
//!             |- rewrite [text]    dispatch(RewriteSelection) -> stdout
//!             |- analyze [text]    dispatch(AnalyzeText)      -> stdout (JSON)
//!             '- scan <file.html>  ScanEngine over LiveDocument -> stdout (HTML)
//! ```
//!
//! Rewrite and analyze go through the same tagged message contract the
//! embedding frontends use, so the full request path is exercised end to end.

use anyhow::{Context, Result, bail};
use std::{
    env,
    fs::{self, OpenOptions},
    io::{self, Read},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tonedown_config::Settings;
use tonedown_engine::{
    GenerationClient, Request, Response, RewriteResult, RewriteService, dispatch,
};
use tonedown_scan::{LiveDocument, ScanEngine};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_tonedown_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over interleaving log
    // lines into command output on stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_tonedown_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let candidates = tonedown_log_file_candidates();
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn tonedown_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.tonedown/logs/tonedown.log
    if let Some(config_path) = Settings::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("tonedown.log"));
    }

    // Fallback: ./.tonedown/logs/tonedown.log (useful in constrained environments)
    candidates.push(PathBuf::from(".tonedown").join("logs").join("tonedown.log"));

    candidates
}

fn print_usage() {
    eprintln!("usage: tonedown <command> [args]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  rewrite [text]     rewrite text in a calmer tone (reads stdin when omitted)");
    eprintln!("  analyze [text]     analyze tone, rewriting only when warranted (JSON output)");
    eprintln!("  scan <file.html>   rewrite comment-like regions of an HTML document");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        bail!("missing command");
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(error = %err, "falling back to default settings");
            Settings::default()
        }
    };
    let service = RewriteService::new(
        GenerationClient::new(),
        settings.api_key().map(str::to_string),
        settings.model().map(str::to_string),
    );

    match command.as_str() {
        "rewrite" => run_rewrite(&service, args.next()).await,
        "analyze" => run_analyze(&service, args.next()).await,
        "scan" => run_scan(service, args.next()).await,
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }
}

async fn run_rewrite(service: &RewriteService, text: Option<String>) -> Result<()> {
    let text = read_input(text)?;
    let result = send(service, Request::RewriteSelection { text }).await?;
    println!("{}", result.rewritten_text);
    Ok(())
}

async fn run_analyze(service: &RewriteService, text: Option<String>) -> Result<()> {
    let text = read_input(text)?;
    let result = send(service, Request::AnalyzeText { text }).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_scan(service: RewriteService, path: Option<String>) -> Result<()> {
    let Some(path) = path else {
        print_usage();
        bail!("scan needs a file path");
    };
    let html = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;

    let mut doc = LiveDocument::parse(&html);
    let mut engine = ScanEngine::new(Arc::new(service));
    engine.scan_document(&doc);
    tracing::info!(queued = engine.pending_rewrites(), "initial scan complete");
    engine.drain(&mut doc).await;

    println!("{}", doc.to_html(doc.root()));
    Ok(())
}

/// Route a request through the message contract and unwrap the reply.
async fn send(service: &RewriteService, request: Request) -> Result<RewriteResult> {
    let response = dispatch(service, request).await;
    match response {
        Response {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        Response { error, .. } => {
            bail!(error.unwrap_or_else(|| "request failed".to_string()))
        }
    }
}

fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}
