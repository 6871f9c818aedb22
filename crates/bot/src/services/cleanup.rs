//! Cluster cleanup service.
//!
//! This service drives the two Slack-triggered flows:
//! 1. A mention lists the project's clusters and posts the inventory message
//! 2. A button click deletes one cluster and refreshes that message in place

use std::sync::Arc;

use cleanup_reminder_core::ClusterKey;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::dedup::{ClaimGuard, DedupStore};
use crate::error::AppError;
use crate::gke::{ClusterApi, GkeError};
use crate::slack::{
    AppMentionEvent, ChatApi, DELETE_CLUSTER_CALLBACK_ID, InteractionPayload, SlackError, compose,
};

/// Upstream failure while handling a mention.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// Listing clusters failed.
    #[error(transparent)]
    Gke(#[from] GkeError),

    /// Posting the message failed.
    #[error(transparent)]
    Slack(#[from] SlackError),
}

/// What happened to a mention delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionOutcome {
    /// The inventory message was posted.
    Posted,
    /// The event was handled before, or is being handled right now.
    Duplicate,
}

/// Validated button click.
struct DeleteRequest<'a> {
    key: ClusterKey,
    channel: &'a str,
    ts: &'a str,
}

/// Handlers for the cluster cleanup flow.
#[derive(Clone)]
pub struct CleanupService {
    clusters: Arc<dyn ClusterApi>,
    chat: Arc<dyn ChatApi>,
    dedup: Arc<dyn DedupStore>,
    project: String,
}

impl std::fmt::Debug for CleanupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupService")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl CleanupService {
    /// Create a new cleanup service for `project`.
    #[must_use]
    pub fn new(
        clusters: Arc<dyn ClusterApi>,
        chat: Arc<dyn ChatApi>,
        dedup: Arc<dyn DedupStore>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            clusters,
            chat,
            dedup,
            project: project.into(),
        }
    }

    /// Post the cluster inventory in reply to a mention.
    ///
    /// Each `event_id` is posted at most once. An attempt that fails, or
    /// whose future is dropped before posting, is forgotten so that Slack's
    /// redelivery retries it.
    ///
    /// # Errors
    ///
    /// Returns the upstream error if listing clusters or posting fails.
    #[instrument(skip(self, event), fields(channel = %event.channel))]
    pub async fn handle_mention(
        &self,
        event_id: &str,
        event: &AppMentionEvent,
    ) -> Result<MentionOutcome, CleanupError> {
        let claim = match ClaimGuard::acquire(&self.dedup, event_id) {
            Ok(claim) => claim,
            Err(state) => {
                debug!(?state, "Event already handled, skipping");
                return Ok(MentionOutcome::Duplicate);
            }
        };

        self.post_inventory(&event.channel).await?;
        claim.confirm();

        info!("Posted cluster inventory");
        Ok(MentionOutcome::Posted)
    }

    async fn post_inventory(&self, channel: &str) -> Result<(), CleanupError> {
        let clusters = self.clusters.list_clusters(&self.project).await?;
        let message = compose(&clusters, &self.project, channel, None);
        self.chat.post_message(&message).await?;
        Ok(())
    }

    /// Delete the clicked cluster and refresh the message it was listed in.
    ///
    /// Upstream failures are logged and never fail the request; a failed
    /// delete still refreshes the message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` without side effects if the payload is
    /// not a delete-cluster click or lacks the button value, channel or
    /// message timestamp.
    #[instrument(skip(self, payload), fields(callback_id = %payload.callback_id))]
    pub async fn handle_button_submit(&self, payload: &InteractionPayload) -> Result<(), AppError> {
        let request = validate(payload)?;

        for action in &payload.actions {
            info!(
                name = %action.name,
                value = action.value.as_deref().unwrap_or_default(),
                user = payload.user.as_ref().map_or("", |u| u.id.as_str()),
                "Received cluster action"
            );
        }

        match self.clusters.delete_cluster(&self.project, &request.key).await {
            Ok(operation) => {
                info!(cluster = %request.key, operation = %operation.name, "Deleting cluster");
            }
            Err(e) => {
                error!(cluster = %request.key, error = %e, "Failed to delete cluster");
            }
        }

        let clusters = match self.clusters.list_clusters(&self.project).await {
            Ok(clusters) => clusters,
            Err(e) => {
                error!(error = %e, "Failed to re-list clusters, leaving message as is");
                return Ok(());
            }
        };

        let message = compose(&clusters, &self.project, request.channel, Some(request.ts));
        if let Err(e) = self.chat.update_message(&message).await {
            error!(channel = %request.channel, ts = %request.ts, error = %e, "Failed to update message");
        }

        Ok(())
    }
}

fn validate(payload: &InteractionPayload) -> Result<DeleteRequest<'_>, AppError> {
    if payload.callback_id != DELETE_CLUSTER_CALLBACK_ID {
        warn!(callback_id = %payload.callback_id, "Unknown callback");
        return Err(AppError::BadRequest(format!(
            "unsupported callback_id: {}",
            payload.callback_id
        )));
    }

    let value = payload
        .actions
        .first()
        .and_then(|a| a.value.as_deref())
        .ok_or_else(|| AppError::BadRequest("No actions in payload".into()))?;

    let key = ClusterKey::parse(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid cluster key: {e}")))?;

    let channel = payload
        .channel
        .as_ref()
        .map(|c| c.id.as_str())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing channel".into()))?;

    let ts = payload
        .original_message
        .as_ref()
        .map(|m| m.ts.as_str())
        .filter(|ts| !ts.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing original message timestamp".into()))?;

    Ok(DeleteRequest { key, channel, ts })
}
