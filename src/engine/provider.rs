// Wardsim Engine — Generative Collaborator (Google Gemini)
//
// Non-streaming `generateContent` client: one user part plus a
// systemInstruction carrying the persona prompt, reply text read from
// `candidates[0].content.parts[0].text`.
//
// Failure contract (see session.rs): transport and API failures come back
// as `EngineError::Provider`; an empty or missing text part comes back as
// `Ok("")` — degenerate output is the session's call, not the transport's.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::CompletionProvider;
use crate::engine::config::ProviderSettings;
use crate::engine::http::{backoff_delay, is_retryable_status, parse_retry_after, MAX_RETRIES};
use async_trait::async_trait;
use log::{info, warn};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;

// ── Gemini ─────────────────────────────────────────────────────────────────

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        GeminiProvider {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }

    async fn complete_inner(&self, system_prompt: &str, utterance: &str) -> EngineResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": utterance }] }],
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
        });

        info!("[provider] Gemini request model={}", self.model);

        let mut last_error = String::new();
        let mut retry_after: Option<u64> = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt - 1, retry_after.take()).await;
                warn!(
                    "[provider] Gemini retry {}/{} after {}ms",
                    attempt,
                    MAX_RETRIES,
                    delay.as_millis()
                );
            }

            let response = match self.client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = format!("HTTP request failed: {}", e);
                    if attempt < MAX_RETRIES {
                        continue;
                    }
                    return Err(EngineError::provider("gemini", last_error));
                }
            };

            if !response.status().is_success() {
                let status = response.status().as_u16();
                retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);
                let body_text = response.text().await.unwrap_or_default();
                let snippet: String = body_text.chars().take(200).collect();
                last_error = format!("API error {}: {}", status, snippet);
                if is_retryable_status(status) && attempt < MAX_RETRIES {
                    continue;
                }
                return Err(EngineError::provider("gemini", last_error));
            }

            let result: Value = response.json().await?;
            let text = result["candidates"][0]["content"]["parts"][0]["text"]
                .as_str()
                .unwrap_or("")
                .trim()
                .to_string();
            return Ok(text);
        }

        Err(EngineError::provider("gemini", last_error))
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, system_prompt: &str, utterance: &str) -> EngineResult<String> {
        self.complete_inner(system_prompt, utterance).await
    }
}

// ── Scripted stand-in ──────────────────────────────────────────────────────

/// Deterministic provider that serves queued replies, then errors.
/// Used by the test suite; also handy for offline demos.
pub struct ScriptedProvider {
    replies: parking_lot::Mutex<VecDeque<EngineResult<String>>>,
}

impl ScriptedProvider {
    pub fn new<I: IntoIterator<Item = &'static str>>(replies: I) -> Self {
        ScriptedProvider {
            replies: parking_lot::Mutex::new(
                replies.into_iter().map(|r| Ok(r.to_string())).collect(),
            ),
        }
    }

    /// Queue a transport-style failure as the next response.
    pub fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .push_back(Err(EngineError::provider("scripted", message)));
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system_prompt: &str, _utterance: &str) -> EngineResult<String> {
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::provider("scripted", "no reply queued")))
    }
}
