//! Outbound Slack message types.
//!
//! These model the legacy "message attachments" format, which is what
//! `interactive_message` callbacks are delivered for.
//!
//! See: <https://api.slack.com/legacy/interactive-messages>

use serde::{Deserialize, Serialize};

/// A message for `chat.postMessage` or `chat.update`.
///
/// When `ts` is set the message targets an existing post and must go
/// through `chat.update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Channel ID to post to.
    pub channel: String,
    /// Message body (mrkdwn).
    pub text: String,
    /// Interactive attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Timestamp of the message being edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Edit as the bot user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_user: Option<bool>,
}

impl ChatMessage {
    /// Create a plain text message with no attachments.
    #[must_use]
    pub fn text(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
            attachments: Vec::new(),
            ts: None,
            as_user: None,
        }
    }

    /// Mark this message as an in-place edit of the message at `ts`.
    #[must_use]
    pub fn editing(mut self, ts: impl Into<String>) -> Self {
        self.ts = Some(ts.into());
        self.as_user = Some(true);
        self
    }

    /// All buttons across all attachments, in order.
    pub fn buttons(&self) -> impl Iterator<Item = &ActionButton> {
        self.attachments.iter().flat_map(|a| a.actions.iter())
    }
}

/// Legacy message attachment carrying interactive buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Copy shown above the buttons.
    pub text: String,
    /// Shown by clients that cannot render attachments.
    pub fallback: String,
    /// Identifies the interaction when a button is clicked.
    pub callback_id: String,
    /// Sidebar color.
    pub color: String,
    /// Always `"default"`.
    pub attachment_type: String,
    /// Buttons.
    pub actions: Vec<ActionButton>,
}

/// Action element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Clickable button.
    Button,
}

/// An interactive button inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    /// Action name echoed back on click.
    pub name: String,
    /// Button label.
    pub text: String,
    /// Element type.
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Value echoed back on click.
    pub value: String,
}

impl ActionButton {
    /// Create a button.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            action_type: ActionType::Button,
            value: value.into(),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Response from `chat.postMessage` and `chat.update`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    /// Whether the request was successful.
    pub ok: bool,
    /// Channel ID where the message lives.
    #[serde(default)]
    pub channel: Option<String>,
    /// Message timestamp (unique ID).
    #[serde(default)]
    pub ts: Option<String>,
    /// Error message if not ok.
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_omits_optional_fields() {
        let json = serde_json::to_value(ChatMessage::text("C1", "hello")).unwrap();
        assert_eq!(json, serde_json::json!({"channel": "C1", "text": "hello"}));
    }

    #[test]
    fn editing_sets_ts_and_as_user() {
        let json = serde_json::to_value(ChatMessage::text("C1", "hello").editing("123.456")).unwrap();
        assert_eq!(json["ts"], "123.456");
        assert_eq!(json["as_user"], true);
    }

    #[test]
    fn button_serializes_type_field() {
        let json = serde_json::to_value(ActionButton::new("a", "a", "loc1/a")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "a", "text": "a", "type": "button", "value": "loc1/a"})
        );
    }
}
