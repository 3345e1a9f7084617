// Wardsim Engine — the simulator's behavior layer
//
// Module map:
//   matcher   — best-match scan over the rule store
//   policy    — match-count → reply-mode banding + line selection
//   learning  — keyword extraction, fallback learning, reinforcement
//   store     — ResponseStore + persistence port (JSON file / in-memory)
//   history   — SQLite turn log
//   session   — per-turn orchestration + greeting/reset lifecycle
//   provider  — Gemini generateContent collaborator
//   http      — shared outbound retry/backoff helpers
//   config    — service configuration (TOML + env)
//   server    — the JSON-over-HTTP surface

pub mod config;
pub mod history;
pub mod http;
pub mod learning;
pub mod matcher;
pub mod policy;
pub mod provider;
pub mod server;
pub mod session;
pub mod store;
