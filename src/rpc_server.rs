//! Linkshelf RPC Server: JSON-RPC over stdin/stdout for a front-end shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Event:    {"event":"bookmarks", "snapshot":{...}} whenever the list view changes.
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::io::Write;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use linkshelf::app::App;
use linkshelf::rpc_handler::handle_method;
use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Writes protocol lines to stdout from a single task so responses and events
/// never interleave mid-line.
fn spawn_writer() -> (mpsc::UnboundedSender<Value>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let handle = tokio::spawn(async move {
        let stdout = std::io::stdout();
        while let Some(line) = rx.recv().await {
            let mut out = stdout.lock();
            if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                break;
            }
        }
    });
    (tx, handle)
}

#[tokio::main]
async fn main() {
    let mut settings = SettingsEngine::new(None);
    let load_result = settings.load();
    init_tracing(&settings.get_config().log_filter);
    if let Err(e) = load_result {
        warn!(error = %e, path = %settings.get_config_path().display(), "using default configuration");
    }

    let db_path = settings.database_path();
    let app = match App::new(settings.get_config().clone(), &db_path) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, path = %db_path.display(), "failed to initialize linkshelf");
            std::process::exit(1);
        }
    };

    let mut snapshots = app.list.watch();
    let app = Mutex::new(app);
    let (out, writer) = spawn_writer();

    let events_out = out.clone();
    let events = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if events_out.send(json!({"event": "bookmarks", "snapshot": snapshot})).is_err() {
                break;
            }
        }
    });

    let _ = out.send(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    info!("ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read request");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        let _ = out.send(response);
    }

    app.lock().await.shutdown().await;
    events.abort();
    let _ = events.await;
    drop(out);
    let _ = writer.await;
    info!("shut down");
}
