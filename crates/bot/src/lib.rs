//! Cleanup Reminder bot library.
//!
//! A Slack bot that lists the GKE clusters of one project when mentioned
//! and deletes a cluster when an operator clicks its button.
//!
//! The library exposes the router, state and clients so they can be tested
//! and embedded; `main.rs` only wires them to a listener.
//!
//! # Privileges
//!
//! The bot's service account can delete clusters. Every `/` request is
//! authenticated with the Slack signing secret.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dedup;
pub mod error;
pub mod gke;
pub mod routes;
pub mod services;
pub mod slack;
pub mod state;
