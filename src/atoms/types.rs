// ── Wardsim Atoms: Core types ──────────────────────────────────────────────
// The data structures that flow through the whole engine. Wire-compatible
// with legacy rules files: a rules file is a JSON array of
// `{ keywords: [{word, weight}], reply }` objects, and a history dump is
// an array of `{ role, text }` objects.

use serde::{Deserialize, Serialize};

// ── Response rules ─────────────────────────────────────────────────────────

/// One weighted keyword inside a rule. `weight` starts at 1 and only ever
/// increases through reinforcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub word: String,
    pub weight: u32,
}

impl KeywordEntry {
    pub fn new(word: impl Into<String>) -> Self {
        KeywordEntry { word: word.into(), weight: 1 }
    }
}

/// A stored stimulus-response mapping.
///
/// `id` is a stable uuid used by the maintenance CRUD surface. Files written
/// before ids existed (`#[serde(default)]`) load fine and get ids assigned
/// on load. Rule identity for de-duplication is the exact `reply` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRule {
    #[serde(default)]
    pub id: String,
    pub keywords: Vec<KeywordEntry>,
    pub reply: String,
}

/// Mint a stable id for a new or newly loaded rule.
pub fn new_rule_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ── Matching ───────────────────────────────────────────────────────────────

/// Outcome of scanning the rule store for one utterance.
///
/// `rule_index` points at the winning rule inside the store so that
/// reinforcement can bump its keyword weights in place; `None` iff no rule
/// had a single keyword hit (`count == 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub count: usize,
    pub reply: String,
    pub rule_index: Option<usize>,
}

/// The four confidence bands a match count falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// count ≥ 3 — serve the canned reply verbatim.
    Exact,
    /// count == 2 — serve the fixed "what are you implying" line.
    Ambiguous,
    /// count == 1 — serve a random avoidance line.
    Avoidant,
    /// count == 0 — delegate to the generative collaborator, then learn.
    Fallback,
}

// ── Conversation turns ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the conversation, as exposed over the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

// ── Turn outcomes ──────────────────────────────────────────────────────────

/// The structured result of one resolved turn.
///
/// `persist_error` carries a store-write failure back to the caller without
/// rolling back in-memory state: the reply was already spoken, the rules
/// already mutated. Last write wins on the next successful persist.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub mode: ReplyMode,
    pub match_count: usize,
    pub learned_rule: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

/// What `submit_turn` produced: a resolved turn, or nothing at all for an
/// empty/whitespace utterance (no history mutation, nothing spoken).
#[derive(Debug, Clone)]
pub enum TurnResult {
    Ignored,
    Replied(TurnOutcome),
}
