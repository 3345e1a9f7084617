// ── Wardsim Atoms: Constants ───────────────────────────────────────────────
// All named constants for the crate live here: the patient's scripted lines,
// the match-count thresholds, and the learning gates. Collecting them in one
// place eliminates magic strings and makes the persona auditable — clinical
// educators review these lines, not the code around them.

// ── Match-count thresholds ─────────────────────────────────────────────────
// A rule whose keywords overlap the utterance this many times is trusted
// enough to answer verbatim. Below that, confidence degrades in steps:
// 2 → confused deflection, 1 → avoidance, 0 → generative fallback.
pub const EXACT_MATCH_COUNT: usize = 3;
pub const AMBIGUOUS_MATCH_COUNT: usize = 2;
pub const AVOIDANT_MATCH_COUNT: usize = 1;

// ── Learning gates ─────────────────────────────────────────────────────────
// Used by `learn_from_fallback()` in engine/learning.rs.
// A fallback turn only becomes a stored rule when the utterance yielded at
// least MIN_LEARN_KEYWORDS extractable keywords and the spoken reply is
// strictly longer than MIN_LEARN_REPLY_CHARS characters.
pub const MIN_LEARN_KEYWORDS: usize = 2;
pub const MIN_LEARN_REPLY_CHARS: usize = 5;

// ── Keyword extraction ─────────────────────────────────────────────────────
// Tokens shorter than MIN_KEYWORD_CHARS characters are discarded; at most
// MAX_EXTRACTED_KEYWORDS survivors are kept, in utterance order.
pub const MIN_KEYWORD_CHARS: usize = 2;
pub const MAX_EXTRACTED_KEYWORDS: usize = 5;

/// Punctuation that separates keywords, beyond Unicode whitespace.
/// Includes the full-width East-Asian variants — trainees type in either.
pub const KEYWORD_SEPARATORS: &[char] = &[',', '.', '!', '?', '，', '。', '！', '？'];

// ── Generative-output gate ─────────────────────────────────────────────────
// Generated text shorter than this (after trimming) is treated as degenerate
// and replaced with a scripted fallback line.
pub const MIN_GENERATED_CHARS: usize = 2;

// ── The patient's scripted lines ───────────────────────────────────────────

/// Served when no rule matches at all and before the fallback resolves.
pub const SILENCE_REPLY: &str = "……(the patient sits in silence)";

/// Served on exactly two keyword hits — close enough to unsettle, not
/// close enough to trust the canned reply.
pub const AMBIGUOUS_REPLY: &str =
    "You... are you implying something? I don't understand.";

/// One of these is served, uniformly at random, on a single keyword hit.
pub const AVOIDANCE_REPLIES: &[&str] = &[
    "(looks down, saying nothing...)",
    "(glances anxiously around the room, ignoring you...)",
    "(turns abruptly to the window: \"nice weather today...\")",
];

/// One of these replaces a degenerate (empty / too-short) generative reply.
pub const DEGENERATE_FALLBACK_REPLIES: &[&str] = &[
    "Did... did you hear that voice just now too?",
    "I don't know... none of them like me.",
    "Why do you always ask me things like that?",
    "I don't want to talk about this, okay?",
];

/// Served when the generative collaborator is unreachable or times out.
pub const TRANSPORT_FAILURE_REPLY: &str =
    "(glances anxiously around) Stop asking, okay? I didn't do anything... really!";

/// Served by the HTTP layer when a turn is already in flight.
pub const TURN_IN_FLIGHT_REPLY: &str = "(the patient is still speaking...)";

/// Appended to every session-start / reset greeting.
pub const GREETING_OPENER: &str =
    "(The patient looks down, avoiding eye contact...)";

// ── Persona prompt ─────────────────────────────────────────────────────────
// System instruction for the generative collaborator. Overridable in config;
// this default mirrors the training scenario the simulator ships with.
pub const DEFAULT_PERSONA_PROMPT: &str = "\
You are a psychiatric inpatient showing mild anxiety and paranoid ideation. \
Every line the nurse types is a question or intervention directed at you. \
Always answer as the patient: confused, low, depressed, or briefly avoidant. \
Avoid long rational answers. Examples:
- (silence...)
- Is this about that thing?
- They're watching me again...
- (head down) I don't want to talk about this.
Stay in this role at all times.";

// ── Provider defaults ──────────────────────────────────────────────────────

pub const DEFAULT_GEMINI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Upper bound on one generative call, end to end (connect + retries).
/// The session degrades to TRANSPORT_FAILURE_REPLY when it elapses.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
