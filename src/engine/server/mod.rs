// Wardsim Engine — HTTP Server Core
//
// TCP listener, request framing, and stop signal. Routing lives in
// `routes`. Hand-built HTTP/1.1 — the surface is five JSON endpoints on
// a trusted loopback bind, nothing that warrants a framework.

mod routes;

pub use routes::SharedSession;

use crate::atoms::error::EngineResult;
use crate::engine::config::Config;

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Hard cap on a request (headers + body). Rule uploads are small; anything
/// past this is a client bug or abuse.
const MAX_REQUEST_BYTES: usize = 256 * 1024;

// ── Stop Signal ────────────────────────────────────────────────────────

static STOP: OnceLock<Arc<AtomicBool>> = OnceLock::new();

fn stop_signal() -> Arc<AtomicBool> {
    STOP.get_or_init(|| Arc::new(AtomicBool::new(false))).clone()
}

/// Ask the accept loop to wind down. Observed within one accept timeout.
pub fn request_stop() {
    stop_signal().store(true, Ordering::Relaxed);
}

// ── Server Core ────────────────────────────────────────────────────────

pub async fn run_server(config: &Config, session: SharedSession) -> EngineResult<()> {
    let stop = stop_signal();
    let addr = format!("{}:{}", config.bind_address, config.port);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Bind {} failed: {}", addr, e))?;

    info!("[server] Listening on http://{}", addr);

    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        // Accept with timeout so we can check the stop signal
        let accept =
            tokio::time::timeout(std::time::Duration::from_secs(1), listener.accept()).await;

        match accept {
            Ok(Ok((stream, peer))) => {
                let session = session.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, session).await {
                        warn!("[server] Connection error from {}: {}", peer, e);
                    }
                });
            }
            Ok(Err(e)) => {
                warn!("[server] Accept error: {}", e);
            }
            Err(_) => { /* timeout — loop to check stop signal */ }
        }
    }

    info!("[server] Stopped");
    Ok(())
}

// ── Connection Handler ─────────────────────────────────────────────────

async fn handle_connection(mut stream: TcpStream, session: SharedSession) -> EngineResult<()> {
    let raw = match read_request(&mut stream).await? {
        Some(raw) => raw,
        None => return Ok(()),
    };

    let response = match parse_request(&raw) {
        Some(request) => {
            let (status, body) = routes::dispatch(&request, &session).await;
            build_response(status, &body.to_string())
        }
        None => build_response(400, r#"{"error":"malformed request"}"#),
    };

    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| format!("Write response: {e}"))?;
    Ok(())
}

/// Read one HTTP/1.1 request: headers up to the blank line, then exactly
/// `Content-Length` body bytes. Returns `None` on an immediately closed
/// connection.
async fn read_request(stream: &mut TcpStream) -> EngineResult<Option<Vec<u8>>> {
    let mut raw: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| format!("Read request: {e}"))?;
        if n == 0 {
            if raw.is_empty() {
                return Ok(None);
            }
            return Err("Connection closed mid-request".into());
        }
        raw.extend_from_slice(&chunk[..n]);
        if raw.len() > MAX_REQUEST_BYTES {
            return Err("Request too large".into());
        }
        if let Some(pos) = find_header_end(&raw) {
            break pos;
        }
    };

    let content_length = content_length(&raw[..header_end]);
    let total = header_end + 4 + content_length;
    if total > MAX_REQUEST_BYTES {
        return Err("Request too large".into());
    }
    while raw.len() < total {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| format!("Read body: {e}"))?;
        if n == 0 {
            return Err("Connection closed mid-body".into());
        }
        raw.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(raw))
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    text.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

fn parse_request(raw: &[u8]) -> Option<routes::Request> {
    let header_end = find_header_end(raw)?;
    let head = String::from_utf8_lossy(&raw[..header_end]);
    let first_line = head.lines().next()?;
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    // Ignore any query string — routes key on the path alone.
    let path = target.split('?').next().unwrap_or(target).to_string();
    let body = String::from_utf8_lossy(&raw[header_end + 4..]).into_owned();
    Some(routes::Request { method, path, body })
}

fn build_response(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "OK",
    };
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    )
}
