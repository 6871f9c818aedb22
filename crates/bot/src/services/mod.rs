//! Business logic services for the bot.
//!
//! # Services
//!
//! - `cleanup` - Mention and button-click handlers for the cluster cleanup flow

pub mod cleanup;

pub use cleanup::{CleanupError, CleanupService, MentionOutcome};
