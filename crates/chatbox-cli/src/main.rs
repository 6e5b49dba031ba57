//! # chatbox
//!
//! Terminal chat client: connects to a chat room over WebSocket, prints the
//! transcript to stdout, and sends each line typed on stdin.

#![deny(unsafe_code)]

mod render;

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chatbox_client::transport::{WsConnector, WsSink};
use chatbox_client::{ChatSession, Notice, Renderer, SessionConfig, TargetTemplate, driver};
use chatbox_core::{ConnectionState, CookieJar};
use chatbox_settings::{ChatboxSettings, ConnectionSettings};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::render::TerminalRenderer;

/// How long to wait for the close handshake on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Terminal chat client.
#[derive(Parser, Debug)]
#[command(name = "chatbox", about = "Terminal chat client", version)]
struct Cli {
    /// Connection URL template; `{room}` and `{id}` are substituted.
    #[arg(long)]
    url: Option<String>,

    /// Room to join (requires `{room}` in the URL template).
    #[arg(long)]
    room: Option<String>,

    /// Cookie string holding the session credential (`uid=...; theme=...`).
    #[arg(long, env = "CHATBOX_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Read the cookie string from a file instead. Wins over `--cookie`.
    #[arg(long)]
    cookie_file: Option<PathBuf>,

    /// Credential key to look up; repeat to try several in order.
    #[arg(long = "credential-key")]
    credential_keys: Vec<String>,

    /// Handshake timeout in milliseconds.
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Settings file (defaults to `~/.chatbox/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level or filter directive (logs go to stderr).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Apply flags over loaded settings.
    fn apply(&self, settings: &mut ChatboxSettings) {
        if let Some(ref url) = self.url {
            settings.connection.url.clone_from(url);
        }
        if let Some(ref room) = self.room {
            settings.connection.room = Some(room.clone());
        }
        if !self.credential_keys.is_empty() {
            settings.connection.credential_keys.clone_from(&self.credential_keys);
        }
        if let Some(ms) = self.connect_timeout_ms {
            settings.connection.connect_timeout_ms = ms;
        }
        if let Some(ref level) = self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }

    /// Credentials from `--cookie-file`, `--cookie`/`CHATBOX_COOKIE`, or none.
    fn credentials(&self) -> Result<CookieJar> {
        if let Some(ref path) = self.cookie_file {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read cookie file: {}", path.display()))?;
            return Ok(CookieJar::parse(raw.trim_end()));
        }
        Ok(self.cookie.as_deref().map(CookieJar::parse).unwrap_or_default())
    }
}

fn session_config(connection: &ConnectionSettings) -> chatbox_core::Result<SessionConfig> {
    let target = TargetTemplate::parse(&connection.url)?;
    let mut config =
        SessionConfig::new(target).with_credential_keys(connection.credential_keys.iter().cloned());
    if let Some(ref room) = connection.room {
        config = config.with_room(room.as_str());
    }
    Ok(config)
}

/// Forward lines from `reader` until EOF or the receiver goes away.
///
/// Lines that are not valid UTF-8 are skipped. Runs on a plain thread:
/// blocking stdin reads inside the runtime would hold up shutdown.
fn forward_lines<R: BufRead>(reader: R, tx: &mpsc::Sender<String>) {
    for raw in reader.split(b'\n') {
        let mut raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "stopped reading input");
                break;
            }
        };
        if raw.last() == Some(&b'\r') {
            let _ = raw.pop();
        }
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "skipping input line that is not UTF-8");
                continue;
            }
        };
        if tx.blocking_send(line).is_err() {
            break;
        }
    }
}

async fn shutdown(sink: WsSink) {
    if tokio::time::timeout(SHUTDOWN_GRACE, sink.shutdown()).await.is_err() {
        warn!("close handshake did not finish in time");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(chatbox_settings::settings_path);
    let mut settings = chatbox_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings: {}", settings_path.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid settings")?;

    if settings.logging.json {
        chatbox_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        chatbox_core::logging::init_subscriber(&settings.logging.level);
    }

    let credentials = cli.credentials()?;
    let mut renderer = TerminalRenderer::new(std::io::stdout());

    let config = match session_config(&settings.connection) {
        Ok(config) => config,
        Err(err) => {
            renderer.append(Notice::StartFailed(err.to_string()).into());
            return Ok(ExitCode::FAILURE);
        }
    };
    let connector = WsConnector::new()
        .with_connect_timeout(Duration::from_millis(settings.connection.connect_timeout_ms));

    let Ok((mut session, mut events)) =
        ChatSession::start(&config, &credentials, &connector, renderer)
    else {
        return Ok(ExitCode::FAILURE);
    };

    let (input_tx, mut inputs) = mpsc::channel(16);
    let _reader = std::thread::Builder::new()
        .name("chatbox-stdin".into())
        .spawn(move || forward_lines(std::io::stdin().lock(), &input_tx))
        .context("Failed to spawn input reader")?;

    let interrupted = tokio::select! {
        _ = driver::run(&mut session, &mut events, &mut inputs) => false,
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            true
        }
    };
    if interrupted {
        info!("interrupted");
        session.close();
    }

    let state = session.state();
    let (sink, _renderer) = session.into_parts();
    shutdown(sink).await;

    Ok(if state == ConnectionState::Errored {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
