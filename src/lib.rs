// Wardsim — patient-persona conversation trainer
//
// Layering (one-way dependencies, bottom to top):
//   atoms/   — constants, error enum, core types, trait seams. No I/O.
//   engine/  — matcher, reply policy, learning, stores, session, provider,
//              and the HTTP surface.
//
// The binary in main.rs wires config → stores → session → server.

pub mod atoms;
pub mod engine;
