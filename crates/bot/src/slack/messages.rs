//! Cluster inventory message builder.
//!
//! Builds the interactive message listing a project's clusters, with one
//! delete button per running cluster.

use cleanup_reminder_core::{ClusterKey, ClusterRecord};

use super::types::{ActionButton, Attachment, ChatMessage};

/// Callback ID tying button clicks back to the delete flow.
pub const DELETE_CLUSTER_CALLBACK_ID: &str = "delete_cluster";

/// Slack renders at most this many buttons per attachment.
pub const MAX_BUTTONS: usize = 5;

const ATTACHMENT_TEXT: &str =
    "Click button to delete cluster (I am dumb so I can only show 5 buttons)";
const ATTACHMENT_FALLBACK: &str = "You are unable to delete clusters from this client";
const ATTACHMENT_COLOR: &str = "#3AA3E3";

/// Build the inventory message for `channel`.
///
/// Clusters are listed in the order given. Only `RUNNING` clusters get a
/// delete button, and only the first [`MAX_BUTTONS`] of those. Passing `ts`
/// turns the message into an edit of the message at that timestamp.
#[must_use]
pub fn compose(
    clusters: &[ClusterRecord],
    project: &str,
    channel: &str,
    ts: Option<&str>,
) -> ChatMessage {
    let message = if clusters.is_empty() {
        ChatMessage::text(channel, format!("No clusters in {project}!"))
    } else {
        let listing: String = clusters
            .iter()
            .map(|c| format!(" - `{}` - Status: `{}`\n", c.name, c.status))
            .collect();

        let buttons = clusters
            .iter()
            .filter(|c| c.status.is_running())
            .take(MAX_BUTTONS)
            .map(|c| ActionButton::new(&c.name, &c.name, ClusterKey::from(c).to_string()))
            .collect();

        ChatMessage {
            attachments: vec![Attachment {
                text: ATTACHMENT_TEXT.to_string(),
                fallback: ATTACHMENT_FALLBACK.to_string(),
                callback_id: DELETE_CLUSTER_CALLBACK_ID.to_string(),
                color: ATTACHMENT_COLOR.to_string(),
                attachment_type: "default".to_string(),
                actions: buttons,
            }],
            ..ChatMessage::text(
                channel,
                format!(
                    "There are {} clusters in `{project}` project.\n{listing}Remove them if they are no longer needed :)",
                    clusters.len()
                ),
            )
        }
    };

    match ts {
        Some(ts) if !ts.is_empty() => message.editing(ts),
        _ => message,
    }
}
