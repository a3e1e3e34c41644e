//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories, search indexes and the generation client into
//!   use-case level APIs.
//! - Keep dispatch layers decoupled from storage and provider details.

pub mod flashcard_service;
pub mod generation_service;
pub mod note_service;
pub mod search_service;

use crate::repo::RepoResult;
use log::{info, warn};
use std::time::Instant;

/// Emits one metadata-only log line for a store mutation.
///
/// Expected domain outcomes (duplicate, not found) log at `warn`; they are
/// caller errors, not faults.
pub(crate) fn log_write<T>(event: &str, started_at: Instant, result: &RepoResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err) => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}
