//! vlm-dialog command-line client.
//!
//! Connects to the backend, reads questions from stdin, and prints streamed
//! answers to stdout. Lines starting with `/` are commands: `/image <ref>`,
//! `/abort`, `/reset`, `/quit`.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use vlm_dialog::config::ClientConfig;
use vlm_dialog::domain::SessionUpdate;
use vlm_dialog::error::ClientError;
use vlm_dialog::ws::{Session, SessionHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }

    // TLS provider for wss endpoints
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Load configuration
    let config = ClientConfig::from_env()?;
    tracing::info!(endpoint = %config.endpoint, "starting vlm-dialog");

    let session = Session::open(&config).await?;
    let handle = session.handle();
    let printer = tokio::spawn(print_updates(handle.subscribe()));

    if let Some(image) = config.initial_image.clone() {
        handle.select_image(image).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !handle.is_connected() {
            tracing::warn!("backend disconnected");
            break;
        }
        match run_command(&handle, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(ClientError::Rejected(rejected)) => eprintln!("! {rejected}"),
            Err(err) => return Err(err.into()),
        }
    }

    let engine = session.close().await?;
    printer.abort();
    tracing::info!(turns = engine.state().dialog().len(), "session closed");
    Ok(())
}

/// Executes one input line. Returns `false` when the user quits.
async fn run_command(handle: &SessionHandle, line: &str) -> Result<bool, ClientError> {
    match line {
        "" => {}
        "/quit" => return Ok(false),
        "/abort" => handle.abort().await?,
        "/reset" => handle.reset().await?,
        _ => {
            if let Some(image) = line.strip_prefix("/image ") {
                handle.select_image(image.trim()).await?;
            } else {
                handle.ask(line).await?;
            }
        }
    }
    Ok(true)
}

async fn print_updates(mut updates: broadcast::Receiver<SessionUpdate>) {
    let mut stdout = std::io::stdout();
    loop {
        match updates.recv().await {
            Ok(SessionUpdate::TokenAppended { fragment, .. }) => {
                let _ = write!(stdout, "{fragment}");
                let _ = stdout.flush();
            }
            Ok(SessionUpdate::AnswerFinalized { aborted, .. }) => {
                let _ = writeln!(stdout, "{}", if aborted { " [aborted]" } else { "" });
            }
            Ok(SessionUpdate::QueueDepth { depth }) if depth > 0 => {
                eprintln!("~ {depth} request(s) ahead in queue");
            }
            Ok(SessionUpdate::AnswerFailed { message, .. }) => eprintln!("! {message}"),
            Ok(SessionUpdate::DialogReset { .. }) => eprintln!("~ dialog cleared"),
            Ok(SessionUpdate::Disconnected { .. }) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "printer lagged behind session updates");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
