//! JSON-lines session server on stdin/stdout.
//!
//! Each input line is an event object (`name`, optional `chef_id`,
//! `instr_idx`, `timestamp`). Each output line answers it with the
//! transport status code and either the new `state` and `session`, or an
//! `error` message. The loop ends at end of input or on SIGINT/SIGTERM.

use anyhow::Result;
use brigade_core::{Dispatcher, KitchenError};
use log::{error, info, warn};
use serde_json::{json, Value};
use tokio::{
    io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader},
    signal::unix::{signal, SignalKind},
};

use crate::cli::EventLine;

/// Answers one request line.
pub async fn respond(dispatcher: &Dispatcher, session_id: &str, line: &str) -> Value {
    let request = match serde_json::from_str::<EventLine>(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("rejecting malformed request: {e}");
            return json!({ "status": 400, "error": format!("Invalid request: {e}") });
        }
    };

    match dispatcher
        .dispatch_with_session(&request.into_event(session_id))
        .await
    {
        Ok(record) => json!({
            "status": 200,
            "state": record.state,
            "session": record.session,
        }),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &KitchenError) -> Value {
    json!({ "status": e.kind().status_code(), "error": e.to_string() })
}

async fn serve_lines(dispatcher: &Dispatcher, session_id: &str) -> Result<()> {
    let mut lines = BufReader::new(stdin()).lines();
    let mut out = stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = respond(dispatcher, session_id, line).await;
        out.write_all(response.to_string().as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}

pub async fn run_stdio_server(dispatcher: Dispatcher, session_id: &str) -> Result<()> {
    info!("Serving session '{session_id}' on stdio");

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = serve_lines(&dispatcher, session_id) => {
            match result {
                Ok(()) => info!("Input closed, server stopped"),
                Err(e) => error!("Server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
