//! Gateway event bridge: serenity `EventHandler` -> session event channel.

use std::sync::Mutex;

use serenity::all::{Context, EventHandler, Interaction, Presence, Ready};
use serenity::async_trait;
use tokio::sync::{mpsc, oneshot};

use synthos_types::platform::{PlatformEvent, SessionInfo};

use super::convert;

/// Forwards converted gateway events to the owning session.
///
/// The first `Ready` also completes the pending `open` call through
/// `ready_tx`; later ones (after a reconnect) are only forwarded.
pub struct EventBridge {
    events: mpsc::Sender<PlatformEvent>,
    ready_tx: Mutex<Option<oneshot::Sender<SessionInfo>>>,
}

impl EventBridge {
    pub fn new(events: mpsc::Sender<PlatformEvent>, ready_tx: oneshot::Sender<SessionInfo>) -> Self {
        Self {
            events,
            ready_tx: Mutex::new(Some(ready_tx)),
        }
    }

    async fn forward(&self, event: PlatformEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("session receiver dropped, discarding gateway event");
        }
    }

    fn take_ready_tx(&self) -> Option<oneshot::Sender<SessionInfo>> {
        match self.ready_tx.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

#[async_trait]
impl EventHandler for EventBridge {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let info = SessionInfo {
            user_id: ready.user.id.to_string(),
            username: ready.user.name.clone(),
            application_id: ready.application.id.to_string(),
        };
        tracing::info!(user = %info.username, application_id = %info.application_id, "gateway ready");

        if let Some(tx) = self.take_ready_tx() {
            let _ = tx.send(info.clone());
        }
        self.forward(PlatformEvent::Ready(info)).await;
    }

    async fn interaction_create(&self, _ctx: Context, interaction: Interaction) {
        match convert::interaction(&interaction) {
            Some(event) => self.forward(PlatformEvent::Interaction(event)).await,
            None => tracing::trace!(kind = ?interaction.kind(), "ignoring interaction"),
        }
    }

    async fn message(&self, _ctx: Context, message: serenity::all::Message) {
        self.forward(PlatformEvent::Message(convert::message_event(&message)))
            .await;
    }

    async fn presence_update(&self, _ctx: Context, presence: Presence) {
        self.forward(PlatformEvent::Presence(convert::presence_event(&presence)))
            .await;
    }
}
