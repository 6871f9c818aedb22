//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::config::BotConfig;
use crate::dedup::{DedupStore, InMemoryDedupStore};
use crate::gke::{ClusterApi, GkeClient, GkeError};
use crate::services::CleanupService;
use crate::slack::{ChatApi, SignatureVerifier, SlackClient, SlackError};

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The GKE client could not be built.
    #[error(transparent)]
    Gke(#[from] GkeError),

    /// The Slack client could not be built.
    #[error(transparent)]
    Slack(#[from] SlackError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    verifier: SignatureVerifier,
    verify_interactive: bool,
    cleanup: CleanupService,
}

impl AppState {
    /// Build the state with live Slack and GKE clients.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: &BotConfig) -> Result<Self, StateError> {
        let clusters = GkeClient::new(&config.gcp, config.http_timeout)?;
        let chat = SlackClient::new(&config.slack, config.http_timeout)?;

        Ok(Self::from_parts(
            config,
            Arc::new(clusters),
            Arc::new(chat),
            Arc::new(InMemoryDedupStore::new()),
        ))
    }

    /// Build the state around explicit collaborators.
    #[must_use]
    pub fn from_parts(
        config: &BotConfig,
        clusters: Arc<dyn ClusterApi>,
        chat: Arc<dyn ChatApi>,
        dedup: Arc<dyn DedupStore>,
    ) -> Self {
        let verifier = SignatureVerifier::new(
            config.slack.signing_secret.clone(),
            config.slack.max_request_age,
        );
        let cleanup = CleanupService::new(clusters, chat, dedup, config.gcp.project.clone());

        Self {
            inner: Arc::new(AppStateInner {
                verifier,
                verify_interactive: config.slack.verify_interactive,
                cleanup,
            }),
        }
    }

    /// Slack request signature verifier.
    #[must_use]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.inner.verifier
    }

    /// Whether `/interactive` requests must be signed.
    #[must_use]
    pub fn verify_interactive(&self) -> bool {
        self.inner.verify_interactive
    }

    /// Cluster cleanup handlers.
    #[must_use]
    pub fn cleanup(&self) -> &CleanupService {
        &self.inner.cleanup
    }
}
