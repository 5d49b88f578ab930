//! Mirror the owner's presence onto the tenant identity.

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use synthos_types::platform::{PlatformEvent, Presence, PresenceStatus};

use crate::session::{Listener, SessionContext};

pub struct PresenceMirror {
    owner_id: String,
}

impl PresenceMirror {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }
}

/// Bots cannot appear offline; invisible is the closest match.
pub fn mirrored_status(status: PresenceStatus) -> PresenceStatus {
    match status {
        PresenceStatus::Offline => PresenceStatus::Invisible,
        other => other,
    }
}

impl Listener for PresenceMirror {
    fn on_event<'a>(
        &'a self,
        ctx: &'a SessionContext,
        event: &'a PlatformEvent,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let PlatformEvent::Presence(update) = event else {
                return;
            };
            if update.user_id != self.owner_id {
                return;
            }
            let presence = Presence {
                status: mirrored_status(update.status),
                activity: update.activity.clone(),
            };
            match ctx.connection.update_presence(&presence).await {
                Ok(()) => debug!(status = %presence.status, "mirrored owner presence"),
                Err(e) => warn!(owner_id = %self.owner_id, error = %e, "failed to mirror presence"),
            }
        })
    }
}
