// ── Wardsim Atoms Layer ────────────────────────────────────────────────────
// Pure constants, error types, core data types, and trait seams.
// Dependency rule: atoms may only depend on std and external pure crates.
// Nothing here may import from engine/ or main.rs.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
