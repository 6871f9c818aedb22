//! Core types for Cleanup Reminder.
//!
//! This module provides type-safe wrappers for the GKE cluster inventory.

pub mod cluster;
pub mod key;

pub use cluster::{ClusterRecord, ClusterStatus};
pub use key::{ClusterKey, ClusterKeyError};
