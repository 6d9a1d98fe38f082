mod board;
mod config;
mod db;
mod ipc;
mod logging;
mod roll;
mod roster;
mod source;

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    let config = config::Config::parse();
    logging::init_logging(config.log_filter.as_deref());

    let mut state = ipc::AppState::new(config.roster_source());
    if let Some(source) = state.source.as_ref() {
        tracing::info!(source = %source.describe(), "fetching roster at startup");
        state.board.begin_load();
        let fetched = source.fetch_roster();
        state.board.finish_load(fetched);
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rollboardd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                writeln!(stdout, "{}", resp).context("failed to write response")?;
                stdout.flush().context("failed to flush stdout")?;
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        writeln!(stdout, "{}", resp).context("failed to write response")?;
        stdout.flush().context("failed to flush stdout")?;
    }
    Ok(())
}
