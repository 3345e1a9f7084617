// Wardsim Engine — HTTP Routes
//
// Exactly one handler per method+path. Every response is JSON; bad input
// gets a 400 with a reason, unknown routes a 404, and a turn already in
// flight a 429 carrying an in-character stalling line.

use crate::atoms::constants::TURN_IN_FLIGHT_REPLY;
use crate::atoms::types::{KeywordEntry, ResponseRule, TurnResult};
use crate::engine::session::ConversationSession;

use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedSession = Arc<Mutex<ConversationSession>>;

pub(crate) struct Request {
    pub method: String,
    pub path: String,
    pub body: String,
}

// ── Dispatch ───────────────────────────────────────────────────────────

pub(crate) async fn dispatch(request: &Request, session: &SharedSession) -> (u16, Value) {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/chat") => chat(request, session).await,
        ("POST", "/api/reset") => reset(session).await,
        ("GET", "/api/history") => history(session).await,
        ("GET", "/api/rules") => list_rules(session).await,
        ("POST", "/api/rules") => overwrite_rules(request, session).await,
        ("POST", "/api/rules/new") => create_rule(request, session).await,
        ("PUT", path) if path.starts_with("/api/rules/") => {
            update_rule(request, &path["/api/rules/".len()..], session).await
        }
        ("DELETE", path) if path.starts_with("/api/rules/") => {
            delete_rule(&path["/api/rules/".len()..], session).await
        }
        _ => (404, json!({"error": "not found"})),
    }
}

// ── Conversation ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatBody {
    text: String,
}

async fn chat(request: &Request, session: &SharedSession) -> (u16, Value) {
    let body: ChatBody = match serde_json::from_str(&request.body) {
        Ok(body) => body,
        Err(e) => return (400, json!({"error": format!("invalid chat body: {e}")})),
    };

    // One utterance at a time. A second trainee message while the patient
    // is still "speaking" gets bounced, not queued.
    let mut guard = match session.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            return (
                429,
                json!({"error": "turn in flight", "reply": TURN_IN_FLIGHT_REPLY}),
            );
        }
    };

    match guard.submit_turn(&body.text).await {
        Ok(TurnResult::Replied(outcome)) => match serde_json::to_value(&outcome) {
            Ok(value) => (200, value),
            Err(e) => (500, json!({"error": e.to_string()})),
        },
        Ok(TurnResult::Ignored) => (200, json!({"ignored": true})),
        Err(e) => {
            warn!("[server] Turn failed: {}", e);
            (500, json!({"error": e.to_string()}))
        }
    }
}

async fn reset(session: &SharedSession) -> (u16, Value) {
    let mut guard = session.lock().await;
    match guard.reset() {
        Ok(greeting) => match serde_json::to_value(&greeting) {
            Ok(value) => (200, value),
            Err(e) => (500, json!({"error": e.to_string()})),
        },
        Err(e) => (500, json!({"error": e.to_string()})),
    }
}

async fn history(session: &SharedSession) -> (u16, Value) {
    let guard = session.lock().await;
    match guard.history().turns() {
        Ok(turns) => match serde_json::to_value(&turns) {
            Ok(value) => (200, value),
            Err(e) => (500, json!({"error": e.to_string()})),
        },
        Err(e) => (500, json!({"error": e.to_string()})),
    }
}

// ── Rule Management ────────────────────────────────────────────────────

async fn list_rules(session: &SharedSession) -> (u16, Value) {
    let guard = session.lock().await;
    match serde_json::to_value(guard.store().rules()) {
        Ok(value) => (200, value),
        Err(e) => (500, json!({"error": e.to_string()})),
    }
}

async fn overwrite_rules(request: &Request, session: &SharedSession) -> (u16, Value) {
    let rules: Vec<ResponseRule> = match serde_json::from_str(&request.body) {
        Ok(rules) => rules,
        Err(e) => return (400, json!({"error": format!("invalid rules array: {e}")})),
    };

    let mut guard = session.lock().await;
    match guard.store_mut().replace_all(rules) {
        Ok(()) => (200, json!({"success": true})),
        Err(e) => (500, json!({"error": e.to_string()})),
    }
}

#[derive(Deserialize)]
struct NewRuleBody {
    /// Comma-separated keyword list, e.g. `"sleep,appetite,night"`.
    message: String,
    reply: String,
}

async fn create_rule(request: &Request, session: &SharedSession) -> (u16, Value) {
    let body: NewRuleBody = match serde_json::from_str(&request.body) {
        Ok(body) => body,
        Err(e) => return (400, json!({"error": format!("invalid rule body: {e}")})),
    };

    let mut guard = session.lock().await;
    match guard.store_mut().create_manual(&body.message, &body.reply) {
        Ok(id) => (200, json!({"success": true, "id": id})),
        Err(e) => (400, json!({"error": e.to_string()})),
    }
}

#[derive(Deserialize)]
struct UpdateRuleBody {
    keywords: Vec<String>,
    reply: String,
}

async fn update_rule(request: &Request, id: &str, session: &SharedSession) -> (u16, Value) {
    let body: UpdateRuleBody = match serde_json::from_str(&request.body) {
        Ok(body) => body,
        Err(e) => return (400, json!({"error": format!("invalid rule body: {e}")})),
    };
    let keywords: Vec<KeywordEntry> = body
        .keywords
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(KeywordEntry::new)
        .collect();

    let mut guard = session.lock().await;
    match guard.store_mut().update(id, keywords, body.reply) {
        Ok(true) => (200, json!({"success": true})),
        Ok(false) => (404, json!({"error": "no such rule"})),
        Err(e) => (400, json!({"error": e.to_string()})),
    }
}

async fn delete_rule(id: &str, session: &SharedSession) -> (u16, Value) {
    let mut guard = session.lock().await;
    match guard.store_mut().remove(id) {
        Ok(true) => (200, json!({"success": true})),
        Ok(false) => (404, json!({"error": "no such rule"})),
        Err(e) => (500, json!({"error": e.to_string()})),
    }
}
