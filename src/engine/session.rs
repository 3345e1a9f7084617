// Wardsim Engine — Conversation Session
//
// Orchestrates one trainee turn end to end:
//   matcher → reply policy → (fallback: bounded generative call) →
//   learning → history append → single store persist.
//
// Turns are strictly sequential — the HTTP layer holds the session behind
// an async mutex, so one utterance is fully resolved (including the
// generative call, the only suspension point) before the next is accepted.
//
// Failure philosophy: nothing on this path is fatal. A dead collaborator, a
// corrupt store, a failed write — every one of them degrades to a scripted,
// in-character line so the training illusion survives backend trouble.

use crate::atoms::constants::{GREETING_OPENER, MIN_GENERATED_CHARS, TRANSPORT_FAILURE_REPLY};
use crate::atoms::error::EngineResult;
use crate::atoms::traits::CompletionProvider;
use crate::atoms::types::{ReplyMode, Role, Turn, TurnOutcome, TurnResult};
use crate::engine::history::TurnLog;
use crate::engine::policy::{self, ReplyPolicy};
use crate::engine::store::ResponseStore;
use crate::engine::{learning, matcher};
use chrono::{Local, Timelike};
use log::{info, warn};
use std::time::Duration;

pub struct ConversationSession {
    store: ResponseStore,
    history: TurnLog,
    policy: ReplyPolicy,
    provider: Box<dyn CompletionProvider>,
    persona_prompt: String,
    provider_timeout: Duration,
}

impl ConversationSession {
    /// Wire up a session. A brand-new (empty) history is seeded with the
    /// time-of-day greeting, same as an explicit reset.
    pub fn new(
        store: ResponseStore,
        history: TurnLog,
        policy: ReplyPolicy,
        provider: Box<dyn CompletionProvider>,
        persona_prompt: String,
        provider_timeout: Duration,
    ) -> EngineResult<Self> {
        let session = ConversationSession {
            store,
            history,
            policy,
            provider,
            persona_prompt,
            provider_timeout,
        };
        if session.history.is_empty()? {
            session.history.append(Role::Assistant, &greeting_now())?;
        }
        Ok(session)
    }

    pub fn store(&self) -> &ResponseStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResponseStore {
        &mut self.store
    }

    pub fn history(&self) -> &TurnLog {
        &self.history
    }

    /// Resolve one trainee utterance into a patient reply.
    pub async fn submit_turn(&mut self, utterance: &str) -> EngineResult<TurnResult> {
        let text = utterance.trim();
        if text.is_empty() {
            // No-op by contract: nothing spoken, nothing recorded.
            return Ok(TurnResult::Ignored);
        }

        self.history.append(Role::User, text)?;

        let matched = matcher::find_best_match(text, self.store.rules());
        let mode = policy::classify(matched.count);
        info!("[engine] Turn classified {:?} (count={})", mode, matched.count);

        let mut learned_rule = false;
        let reply = match mode {
            ReplyMode::Exact => matched.reply.clone(),
            ReplyMode::Ambiguous => self.policy.ambiguous_reply().to_string(),
            ReplyMode::Avoidant => self.policy.avoidance_reply().to_string(),
            ReplyMode::Fallback => {
                let (reply, learnable) = self.generate(text).await;
                if learnable {
                    learned_rule =
                        learning::learn_from_fallback(self.store.rules_mut(), text, &reply);
                }
                reply
            }
        };

        self.history.append(Role::Assistant, &reply)?;

        // Reinforce whichever rule actually matched, whatever mode it
        // produced — a one-hit avoidance turn still taught us that keyword.
        let mut store_dirty = learned_rule;
        if let Some(index) = matched.rule_index {
            if learning::reinforce(self.store.rules_mut(), index, text) > 0 {
                store_dirty = true;
            }
        }

        // One canonical persist per turn, covering both learning and
        // reinforcement. A failed write is reported, never rolled back:
        // the reply was already spoken and last write wins next time.
        let mut persist_error = None;
        if store_dirty {
            if let Err(e) = self.store.persist() {
                warn!("[engine] Store persist failed, keeping in-memory state: {}", e);
                persist_error = Some(e.to_string());
            }
        }

        Ok(TurnResult::Replied(TurnOutcome {
            reply,
            mode,
            match_count: matched.count,
            learned_rule,
            persist_error,
        }))
    }

    /// Clear the history and re-seed the greeting turn.
    pub fn reset(&mut self) -> EngineResult<Turn> {
        self.history.clear()?;
        let greeting = greeting_now();
        self.history.append(Role::Assistant, &greeting)?;
        info!("[engine] Session reset");
        Ok(Turn { role: Role::Assistant, text: greeting })
    }

    /// Run the bounded generative call and shape its output.
    ///
    /// Returns `(reply, learnable)`. Transport failures and timeouts come
    /// back with the fixed anxious-refusal line and are never learned; a
    /// degenerate (empty / too-short) completion is substituted with a
    /// random scripted line, which *is* learnable — the stored rule then
    /// replays that scripted line for similar utterances.
    async fn generate(&mut self, utterance: &str) -> (String, bool) {
        let call = self.provider.complete(&self.persona_prompt, utterance);
        let generated = match tokio::time::timeout(self.provider_timeout, call).await {
            Err(_) => {
                warn!(
                    "[engine] Generative call timed out after {:?}",
                    self.provider_timeout
                );
                return (TRANSPORT_FAILURE_REPLY.to_string(), false);
            }
            Ok(Err(e)) => {
                warn!("[engine] Generative call failed: {}", e);
                return (TRANSPORT_FAILURE_REPLY.to_string(), false);
            }
            Ok(Ok(text)) => text,
        };

        let trimmed = generated.trim();
        if trimmed.chars().count() < MIN_GENERATED_CHARS {
            info!("[engine] Degenerate generative output, substituting scripted line");
            (self.policy.degenerate_fallback().to_string(), true)
        } else {
            (trimmed.to_string(), true)
        }
    }
}

// ── Greeting ───────────────────────────────────────────────────────────────

fn greeting_now() -> String {
    greeting_for(Local::now().hour(), &Local::now().format("%Y-%m-%d (%a)").to_string())
}

/// The fixed session-opening line, varying only with the hour band.
pub(crate) fn greeting_for(hour: u32, date: &str) -> String {
    format!("{} Today is {}. {}", salutation(hour), date, GREETING_OPENER)
}

fn salutation(hour: u32) -> &'static str {
    if (6..12).contains(&hour) {
        "Good morning."
    } else if (12..18).contains(&hour) {
        "Good afternoon."
    } else {
        "Good evening."
    }
}
