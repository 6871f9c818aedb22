//! Google Kubernetes Engine API client.
//!
//! Lists and deletes the clusters of one project through the GKE v1 REST
//! API.
//!
//! # Authentication
//!
//! Uses ambient service-account credentials from the GCE metadata server,
//! or a static access token when one is configured.

pub mod auth;
pub mod client;

pub use auth::{AccessToken, TokenProvider};
pub use client::{ClusterApi, GkeClient, Operation};

use thiserror::Error;

/// Errors that can occur when interacting with the GKE API.
#[derive(Debug, Error)]
pub enum GkeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GKE returned a non-success status.
    #[error("GKE API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Could not obtain an access token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Cluster identifier cannot be used in a request path.
    #[error("Invalid cluster identifier: {0}")]
    InvalidIdentifier(String),

    /// Configuration error.
    #[error("GKE configuration error: {0}")]
    Config(String),
}
