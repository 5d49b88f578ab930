//! A running platform session.
//!
//! A session owns one connection, one validated command tree and one
//! listener table. A single worker task drains the connection's event
//! receiver. Messages, presence and ready events are handled in arrival
//! order on the worker; each interaction runs on a task of its own so a
//! slow handler holds up neither the stream nor other interactions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use synthos_types::error::{ConnectionError, SessionError};
use synthos_types::platform::{EventKind, PlatformEvent, SessionInfo};

use super::listener::{Listener, ListenerTable, SessionContext};
use crate::command::CommandTree;
use crate::platform::SharedConnection;

/// Which session a log line or registry entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionLabel {
    Controller,
    Tenant(String),
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionLabel::Controller => write!(f, "controller"),
            SessionLabel::Tenant(owner) => write!(f, "tenant:{owner}"),
        }
    }
}

/// Everything a session runs besides its connection.
pub struct SessionSpec {
    pub label: SessionLabel,
    pub commands: Arc<CommandTree>,
    /// Additional listeners; command interactions are routed to `commands`
    /// ahead of these.
    pub listeners: ListenerTable,
}

pub struct Session {
    label: SessionLabel,
    info: SessionInfo,
    connection: SharedConnection,
    shutdown: CancellationToken,
}

impl Session {
    /// Open `connection`, register the command tree and start the worker.
    ///
    /// If any step fails the connection is closed before the error is
    /// returned.
    pub async fn start(
        spec: SessionSpec,
        connection: SharedConnection,
        mut events: mpsc::Receiver<PlatformEvent>,
        open_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let SessionSpec {
            label,
            commands,
            listeners,
        } = spec;

        let info = match tokio::time::timeout(open_timeout, connection.open()).await {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                abandon(&connection, &label, open_timeout).await;
                return Err(e.into());
            }
            Err(_) => {
                abandon(&connection, &label, open_timeout).await;
                return Err(ConnectionError::Timeout(open_timeout).into());
            }
        };

        if let Err(e) = commands.register(&connection).await {
            abandon(&connection, &label, open_timeout).await;
            return Err(e.into());
        }

        let listeners = Arc::new(
            ListenerTable::new()
                .on(
                    EventKind::CommandInteraction,
                    Arc::clone(&commands) as Arc<dyn Listener>,
                )
                .append(listeners),
        );

        let shutdown = CancellationToken::new();
        let ctx = Arc::new(SessionContext {
            label: label.clone(),
            info: info.clone(),
            connection: Arc::clone(&connection),
        });
        let token = shutdown.clone();
        let span = info_span!("session", session = %label);
        tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        event = events.recv() => match event {
                            Some(event) if event.kind().is_interaction() => {
                                let listeners = Arc::clone(&listeners);
                                let ctx = Arc::clone(&ctx);
                                tokio::spawn(
                                    async move { listeners.dispatch(&ctx, &event).await }
                                        .in_current_span(),
                                );
                            }
                            Some(event) => listeners.dispatch(&ctx, &event).await,
                            None => {
                                debug!("event stream ended");
                                break;
                            }
                        },
                    }
                }
                debug!("session worker stopped");
            }
            .instrument(span),
        );

        info!(session = %label, user = %info.username, "session started");
        Ok(Self {
            label,
            info,
            connection,
            shutdown,
        })
    }

    pub fn label(&self) -> &SessionLabel {
        &self.label
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.connection
    }

    /// Stop taking new events and close the connection within `timeout`.
    ///
    /// Listeners already running, including spawned interaction handlers,
    /// are left to finish on their own.
    pub async fn close(&self, timeout: Duration) -> Result<(), ConnectionError> {
        self.shutdown.cancel();
        match tokio::time::timeout(timeout, self.connection.close()).await {
            Ok(result) => {
                if result.is_ok() {
                    info!(session = %self.label, "session closed");
                }
                result
            }
            Err(_) => Err(ConnectionError::Timeout(timeout)),
        }
    }
}

async fn abandon(connection: &SharedConnection, label: &SessionLabel, timeout: Duration) {
    match tokio::time::timeout(timeout, connection.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(session = %label, error = %e, "failed to close abandoned connection"),
        Err(_) => warn!(session = %label, "timed out closing abandoned connection"),
    }
}
