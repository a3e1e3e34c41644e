//! Note-to-flashcard generation pipeline.
//!
//! # Responsibility
//! - Build deterministic prompts from note text.
//! - Call an external generative text service through a narrow trait.
//! - Admit model output only after strict field-by-field validation.
//!
//! # Invariants
//! - No model value reaches the domain model before it passes validation.
//! - Failed service calls are surfaced once, never retried here.

pub mod client;
pub mod contract;
pub mod prompt;
