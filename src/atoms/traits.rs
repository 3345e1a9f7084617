// ── Wardsim Atoms: Trait seams ─────────────────────────────────────────────
// The three injection points of the engine. Tests substitute all of them:
// a scripted provider, an in-memory rule port, and a seeded random source.

use crate::atoms::error::EngineResult;
use crate::atoms::types::ResponseRule;
use async_trait::async_trait;

/// External text-completion collaborator (the "patient improvises" path).
///
/// Implementations must stay in character on the happy path and surface
/// transport/API problems as errors — the session, not the provider,
/// decides which scripted line covers a failure.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name for logs ("gemini", "scripted").
    fn name(&self) -> &str;

    /// Generate the patient's reply to one utterance.
    async fn complete(&self, system_prompt: &str, utterance: &str) -> EngineResult<String>;
}

/// Persistence port for the canned-response store.
///
/// The store is always written whole (last write wins); there is no
/// patch/merge contract. A missing backing file is an empty store,
/// not an error.
pub trait RulePersistence: Send {
    fn load(&self) -> EngineResult<Vec<ResponseRule>>;
    fn save(&self, rules: &[ResponseRule]) -> EngineResult<()>;
}

/// Injected randomness for avoidance/fallback line selection.
/// Production uses the thread RNG; tests use a seeded generator.
pub trait RandomSource: Send {
    /// Uniform index in `0..upper`. `upper` is never 0 (the line sets are
    /// compile-time non-empty).
    fn pick(&mut self, upper: usize) -> usize;
}
