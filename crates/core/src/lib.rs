//! Cleanup Reminder Core - Shared types library.
//!
//! This crate provides the cluster types shared by the bot and its tests.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Cluster records, statuses and the `location/name` button key

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
