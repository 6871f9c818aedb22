//! Slack integration for the cluster cleanup flow.
//!
//! This module provides:
//! - [`SlackClient`] for posting and updating messages, behind [`ChatApi`]
//! - Inbound payload parsing into [`InboundEvent`]
//! - Webhook signature verification
//! - The cluster inventory message builder
//!
//! # Flow
//!
//! 1. Someone mentions the bot; Slack delivers an `app_mention` event
//! 2. The bot posts the cluster inventory with a delete button per running cluster
//! 3. An operator clicks a button; Slack delivers an `interactive_message`
//! 4. The cluster is deleted and the original message is updated in place

mod client;
mod error;
mod events;
mod messages;
mod signature;
mod types;

pub use client::{ChatApi, SlackClient};
pub use error::SlackError;
pub use events::{
    AppMentionEvent, InboundEvent, InteractionAction, InteractionChannel, InteractionPayload,
    InteractionUser, OriginalMessage,
};
pub use messages::{DELETE_CLUSTER_CALLBACK_ID, MAX_BUTTONS, compose};
pub use signature::{
    SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, compute_signature, verify,
};
pub use types::{ActionButton, ActionType, Attachment, ChatMessage, MessageResponse};
