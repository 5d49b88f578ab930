//! Owner message relay.
//!
//! Each tenant session watches for messages its owner posts and re-posts
//! them under the tenant's identity, then deletes the original. A reply to
//! one of the tenant's own messages that starts with the edit prefix edits
//! that message instead of posting a new one.

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use synthos_types::config::RelayConfig;
use synthos_types::platform::{Message, MessageEvent, OutgoingMessage, PlatformEvent};

use crate::platform::BoxConnection;
use crate::session::{Listener, SessionContext};

/// What to do with one owner message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayDecision {
    EditExisting { message_id: String, content: String },
    SendNew(OutgoingMessage),
}

/// The relay step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStep {
    Fetch,
    Edit,
    Send,
    Delete,
}

/// How processing of one inbound message ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Not the owner's message.
    Ignored,
    /// Action taken and original deleted.
    Relayed(RelayDecision),
    /// Processing of the event stopped at this step.
    Failed(RelayStep),
}

/// Re-posts one owner's messages under the session identity.
///
/// Registered as the `MessageCreate` listener of a tenant session.
pub struct MessageRelay {
    owner_id: String,
    settings: RelayConfig,
}

impl MessageRelay {
    pub fn new(owner_id: impl Into<String>, settings: RelayConfig) -> Self {
        Self {
            owner_id: owner_id.into(),
            settings,
        }
    }

    /// Decide what to do with `event`, given the message it replies to.
    ///
    /// `self_id` is the identity of the relaying session; only its own
    /// messages can be edited.
    pub fn decide(
        &self,
        self_id: &str,
        event: &MessageEvent,
        referenced: Option<&Message>,
    ) -> Option<RelayDecision> {
        if event.author.id != self.owner_id {
            return None;
        }

        let edit_target = event
            .same_channel_reply()
            .zip(referenced)
            .filter(|(reference, message)| {
                message.id == reference.message_id && message.author_id == self_id
            })
            .map(|(_, message)| message);
        if let Some(message) = edit_target {
            if let Some(content) = event.content.strip_prefix(&self.settings.edit_prefix) {
                return Some(RelayDecision::EditExisting {
                    message_id: message.id.clone(),
                    content: content.to_string(),
                });
            }
        }

        // Only a same-channel reply survives; forwards and cross-channel
        // references are dropped from the re-post.
        Some(RelayDecision::SendNew(OutgoingMessage {
            content: format!("{}{}", event.content, self.settings.suffix),
            reference: event.same_channel_reply().cloned(),
        }))
    }

    /// Decide and carry out the relay for one inbound message.
    ///
    /// The original is deleted only after the edit or send succeeded.
    pub async fn relay(
        &self,
        connection: &BoxConnection,
        self_id: &str,
        event: &MessageEvent,
    ) -> RelayOutcome {
        if event.author.id != self.owner_id {
            return RelayOutcome::Ignored;
        }

        let referenced = match event.same_channel_reply() {
            Some(reference) if event.content.starts_with(&self.settings.edit_prefix) => {
                match connection
                    .fetch_message(&reference.channel_id, &reference.message_id)
                    .await
                {
                    Ok(message) => Some(message),
                    Err(e) => {
                        warn!(
                            channel_id = %event.channel_id,
                            message_id = %reference.message_id,
                            error = %e,
                            "failed to fetch referenced message"
                        );
                        return RelayOutcome::Failed(RelayStep::Fetch);
                    }
                }
            }
            _ => None,
        };

        let Some(decision) = self.decide(self_id, event, referenced.as_ref()) else {
            return RelayOutcome::Ignored;
        };

        let action = match &decision {
            RelayDecision::EditExisting {
                message_id,
                content,
            } => connection
                .edit_message(&event.channel_id, message_id, content)
                .await
                .map_err(|e| (RelayStep::Edit, e)),
            RelayDecision::SendNew(message) => connection
                .send_message(&event.channel_id, message)
                .await
                .map_err(|e| (RelayStep::Send, e)),
        };
        if let Err((step, e)) = action {
            warn!(channel_id = %event.channel_id, step = ?step, error = %e, "relay action failed");
            return RelayOutcome::Failed(step);
        }

        if let Err(e) = connection.delete_message(&event.channel_id, &event.id).await {
            warn!(
                channel_id = %event.channel_id,
                message_id = %event.id,
                error = %e,
                "failed to delete relayed message"
            );
            return RelayOutcome::Failed(RelayStep::Delete);
        }

        debug!(channel_id = %event.channel_id, message_id = %event.id, "relayed owner message");
        RelayOutcome::Relayed(decision)
    }
}

impl Listener for MessageRelay {
    fn on_event<'a>(
        &'a self,
        ctx: &'a SessionContext,
        event: &'a PlatformEvent,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let PlatformEvent::Message(message) = event {
                self.relay(&ctx.connection, &ctx.info.user_id, message).await;
            }
        })
    }
}
