//! Per-session event listeners.
//!
//! Each session owns an explicit, ordered table of `(EventKind, Listener)`
//! pairs. For every inbound event the table runs each listener registered
//! for that kind in registration order, awaiting one before the next.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use synthos_types::platform::{EventKind, PlatformEvent, SessionInfo};

use super::session::SessionLabel;
use crate::platform::SharedConnection;

/// What a listener sees besides the event itself.
pub struct SessionContext {
    pub label: SessionLabel,
    /// Identity reported when the connection opened.
    pub info: SessionInfo,
    pub connection: SharedConnection,
}

/// Reacts to events of the kinds it was registered for.
///
/// Listeners handle their own failures; nothing is returned to the session.
pub trait Listener: Send + Sync {
    fn on_event<'a>(
        &'a self,
        ctx: &'a SessionContext,
        event: &'a PlatformEvent,
    ) -> BoxFuture<'a, ()>;
}

#[derive(Default, Clone)]
pub struct ListenerTable {
    entries: Vec<(EventKind, Arc<dyn Listener>)>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, kind: EventKind, listener: Arc<dyn Listener>) -> Self {
        self.entries.push((kind, listener));
        self
    }

    /// Add every entry of `other` after the existing ones.
    pub fn append(mut self, other: ListenerTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn dispatch(&self, ctx: &SessionContext, event: &PlatformEvent) {
        let kind = event.kind();
        for (_, listener) in self.entries.iter().filter(|(k, _)| *k == kind) {
            listener.on_event(ctx, event).await;
        }
    }
}
