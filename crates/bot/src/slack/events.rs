//! Inbound Slack payloads.
//!
//! Payloads are parsed once, at the HTTP boundary, into [`InboundEvent`].
//! Handlers only ever see the typed variants.

use serde::Deserialize;
use serde_json::Value;

use super::error::SlackError;

const URL_VERIFICATION: &str = "url_verification";
const INTERACTIVE_MESSAGE: &str = "interactive_message";
const APP_MENTION: &str = "app_mention";

/// A parsed webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Endpoint ownership handshake.
    UrlVerification {
        /// Value to echo back.
        challenge: String,
    },
    /// Button click on a legacy interactive message.
    InteractiveMessage(InteractionPayload),
    /// The bot was mentioned in a channel.
    AppMention {
        /// Delivery-independent event ID, stable across retries.
        event_id: String,
        /// The mention itself.
        event: AppMentionEvent,
    },
    /// Anything else. Acknowledged and dropped.
    Ignored {
        /// What was received, for logging.
        kind: String,
    },
}

impl InboundEvent {
    /// Parse a JSON Events API body.
    ///
    /// # Errors
    ///
    /// Returns `SlackError::InvalidPayload` if the body is not JSON, has no
    /// `type`, or a recognized event lacks a field its handler needs.
    pub fn parse(body: &[u8]) -> Result<Self, SlackError> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| SlackError::InvalidPayload(e.to_string()))?;

        match envelope.kind.as_str() {
            URL_VERIFICATION => envelope
                .challenge
                .map(|challenge| Self::UrlVerification { challenge })
                .ok_or_else(|| SlackError::InvalidPayload("missing challenge".to_string())),
            INTERACTIVE_MESSAGE => serde_json::from_slice(body)
                .map(Self::InteractiveMessage)
                .map_err(|e| SlackError::InvalidPayload(e.to_string())),
            _ => Self::from_callback(envelope),
        }
    }

    /// Parse a form-encoded interactive body (`payload=<json>`).
    ///
    /// Only `interactive_message` payloads are surfaced; every other type
    /// comes back as [`InboundEvent::Ignored`].
    ///
    /// # Errors
    ///
    /// Returns `SlackError::InvalidPayload` if the `payload` field is missing
    /// or does not hold a JSON object with a `type`.
    pub fn parse_interactive_form(body: &[u8]) -> Result<Self, SlackError> {
        let payload = url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| SlackError::InvalidPayload("missing payload field".to_string()))?;

        let envelope: Envelope = serde_json::from_str(&payload)
            .map_err(|e| SlackError::InvalidPayload(e.to_string()))?;

        if envelope.kind != INTERACTIVE_MESSAGE {
            return Ok(Self::Ignored {
                kind: envelope.kind,
            });
        }

        serde_json::from_str(&payload)
            .map(Self::InteractiveMessage)
            .map_err(|e| SlackError::InvalidPayload(e.to_string()))
    }

    fn from_callback(envelope: Envelope) -> Result<Self, SlackError> {
        let Some(event) = envelope.event else {
            return Ok(Self::Ignored {
                kind: envelope.kind,
            });
        };

        let event_type = event
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if event_type != APP_MENTION {
            return Ok(Self::Ignored {
                kind: format!("{}:{event_type}", envelope.kind),
            });
        }

        let event_id = envelope
            .event_id
            .ok_or_else(|| SlackError::InvalidPayload("missing event_id".to_string()))?;
        let event: AppMentionEvent = serde_json::from_value(event)
            .map_err(|e| SlackError::InvalidPayload(e.to_string()))?;

        Ok(Self::AppMention { event_id, event })
    }
}

/// Fields common to every payload, used to pick the variant.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    event: Option<Value>,
}

/// `app_mention` event body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppMentionEvent {
    /// Channel the mention happened in.
    pub channel: String,
    /// User who mentioned the bot.
    #[serde(default)]
    pub user: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Message timestamp.
    #[serde(default)]
    pub ts: Option<String>,
}

/// Legacy `interactive_message` payload sent on button click.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionPayload {
    /// Identifies which attachment the clicked button belonged to.
    #[serde(default)]
    pub callback_id: String,
    /// Buttons that were clicked (always one in practice).
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
    /// Channel the message lives in.
    #[serde(default)]
    pub channel: Option<InteractionChannel>,
    /// The message that contained the button.
    #[serde(default)]
    pub original_message: Option<OriginalMessage>,
    /// User who clicked.
    #[serde(default)]
    pub user: Option<InteractionUser>,
}

/// Action that was triggered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionAction {
    /// Button name.
    #[serde(default)]
    pub name: String,
    /// Value attached to the button.
    #[serde(default)]
    pub value: Option<String>,
    /// Action type.
    #[serde(rename = "type", default)]
    pub action_type: Option<String>,
}

/// Channel where interaction occurred.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionChannel {
    /// Channel ID.
    pub id: String,
    /// Channel name.
    #[serde(default)]
    pub name: Option<String>,
}

/// The message the button was attached to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OriginalMessage {
    /// Message timestamp.
    pub ts: String,
}

/// User who triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionUser {
    /// Slack user ID.
    pub id: String,
    /// Username.
    #[serde(default)]
    pub name: Option<String>,
}
