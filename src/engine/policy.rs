// Wardsim Engine — Reply Policy
//
// Turns a match count into one of four reply modes. The banding encodes the
// simulator's core wager: the more of a rule's keywords the trainee's line
// contains, the more confident we are that the canned reply is topically
// right. One or two stray hits get graded, in-character deflection instead;
// zero hits hand the turn to the generative collaborator so the store can
// grow (engine/learning.rs).
//
// Randomness is injected (`RandomSource`) so avoidance-line selection is
// deterministic under test.

use crate::atoms::constants::{
    AMBIGUOUS_MATCH_COUNT, AMBIGUOUS_REPLY, AVOIDANCE_REPLIES, AVOIDANT_MATCH_COUNT,
    DEGENERATE_FALLBACK_REPLIES, EXACT_MATCH_COUNT,
};
use crate::atoms::traits::RandomSource;
use crate::atoms::types::ReplyMode;

// ── Classification ─────────────────────────────────────────────────────────

/// Pure banding of a match count into a reply mode.
pub fn classify(count: usize) -> ReplyMode {
    if count >= EXACT_MATCH_COUNT {
        ReplyMode::Exact
    } else if count == AMBIGUOUS_MATCH_COUNT {
        ReplyMode::Ambiguous
    } else if count == AVOIDANT_MATCH_COUNT {
        ReplyMode::Avoidant
    } else {
        ReplyMode::Fallback
    }
}

// ── Scripted-line selection ────────────────────────────────────────────────

/// Owns the random source used to pick among the fixed line sets.
pub struct ReplyPolicy {
    rng: Box<dyn RandomSource>,
}

impl ReplyPolicy {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        ReplyPolicy { rng }
    }

    /// The fixed line for a two-hit (ambiguous) match.
    pub fn ambiguous_reply(&self) -> &'static str {
        AMBIGUOUS_REPLY
    }

    /// A uniformly random avoidance line for a one-hit match.
    pub fn avoidance_reply(&mut self) -> &'static str {
        AVOIDANCE_REPLIES[self.rng.pick(AVOIDANCE_REPLIES.len())]
    }

    /// A uniformly random substitute for a degenerate generative reply.
    pub fn degenerate_fallback(&mut self) -> &'static str {
        DEGENERATE_FALLBACK_REPLIES[self.rng.pick(DEGENERATE_FALLBACK_REPLIES.len())]
    }
}

// ── Random sources ─────────────────────────────────────────────────────────

/// Production randomness: the thread RNG.
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn pick(&mut self, upper: usize) -> usize {
        use rand::Rng;
        rand::rng().random_range(0..upper)
    }
}

/// Seeded randomness for deterministic tests and replayable demo sessions.
pub struct SeededRandom {
    rng: rand::rngs::StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        SeededRandom { rng: rand::rngs::StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&mut self, upper: usize) -> usize {
        use rand::Rng;
        self.rng.random_range(0..upper)
    }
}
