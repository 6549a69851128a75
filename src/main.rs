mod attendance;
mod calc;
mod config;
mod ipc;
mod records;

use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries the protocol; logs go to stderr only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = config::Config::from_env()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        candidates = ?config.record_candidates,
        load_on_start = config.load_on_start,
        "classroomd starting"
    );

    let mut state = ipc::AppState::new(config);
    if state.config.load_on_start {
        let candidates = state.config.record_candidates.clone();
        match state.records.load_first(&candidates) {
            Ok(summary) => tracing::info!(
                path = %summary.path.display(),
                count = summary.count,
                skipped = summary.skipped,
                "records loaded"
            ),
            Err(e) => tracing::warn!(error = %e, "no records loaded at startup"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed; shutting down");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                tracing::debug!(error = %e, "bad request line");
                ipc::bad_json(e.to_string())
            }
        };

        writeln!(stdout, "{}", resp)?;
        stdout.flush()?;
    }

    tracing::info!("stdin closed; exiting");
    Ok(())
}
