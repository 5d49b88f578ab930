//! Validated command trees: registration payload and dispatch.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, error, warn};

use synthos_types::command::{CommandSpec, RegistrationPayload};
use synthos_types::error::ConnectionError;
use synthos_types::interaction::{InteractionData, InteractionEvent, OptionValue};
use synthos_types::platform::PlatformEvent;

use super::builder::CommandTreeBuilder;
use super::handler::{Invocation, SharedHandler};
use crate::platform::{BoxConnection, SharedConnection};
use crate::session::{Listener, SessionContext};

pub(crate) enum Route {
    Handler(SharedHandler),
    Subcommands(Vec<(String, SharedHandler)>),
}

pub(crate) struct CommandEntry {
    pub(crate) spec: CommandSpec,
    pub(crate) route: Route,
}

/// Why an interaction reached no handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotACommand,
    NoInvoker,
    UnknownCommand,
    UnknownSubcommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// The handler ran and returned an error; it has been logged.
    Failed,
    Dropped(DropReason),
}

/// An immutable, validated command forest.
pub struct CommandTree {
    entries: Vec<CommandEntry>,
}

impl CommandTree {
    pub fn builder() -> CommandTreeBuilder {
        CommandTreeBuilder::default()
    }

    pub(crate) fn from_entries(entries: Vec<CommandEntry>) -> Self {
        Self { entries }
    }

    /// The forest as sent to the platform, in declaration order.
    pub fn payload(&self) -> RegistrationPayload {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.spec.name.as_str())
    }

    /// Replace every registered command with this tree in one call.
    pub async fn register(&self, connection: &BoxConnection) -> Result<(), ConnectionError> {
        connection.register_commands(&self.payload()).await
    }

    /// Route a command interaction to its handler.
    ///
    /// Never responds to the interaction itself and never propagates handler
    /// errors; both drops and failures are logged here.
    pub async fn dispatch(
        &self,
        connection: &SharedConnection,
        event: &InteractionEvent,
    ) -> DispatchOutcome {
        let InteractionData::Command { name, options } = &event.data else {
            return DispatchOutcome::Dropped(DropReason::NotACommand);
        };
        let Some(requester) = event.invoker().cloned() else {
            warn!(command = %name, interaction_id = %event.id, "dropping command without invoker");
            return DispatchOutcome::Dropped(DropReason::NoInvoker);
        };
        let Some(entry) = self.entries.iter().find(|e| e.spec.name == *name) else {
            warn!(command = %name, "dropping unknown command");
            return DispatchOutcome::Dropped(DropReason::UnknownCommand);
        };

        let (handler, options) = match &entry.route {
            Route::Handler(handler) => (handler, options.clone()),
            Route::Subcommands(subcommands) => {
                let matched = options.first().and_then(|first| {
                    subcommands
                        .iter()
                        .find(|(sub, _)| *sub == first.name)
                        .map(|(_, handler)| (handler, first))
                });
                let Some((handler, first)) = matched else {
                    warn!(command = %name, "dropping command with unknown subcommand");
                    return DispatchOutcome::Dropped(DropReason::UnknownSubcommand);
                };
                let nested = match &first.value {
                    OptionValue::SubCommand(nested) => nested.clone(),
                    _ => options[1..].to_vec(),
                };
                (handler, nested)
            }
        };

        debug!(command = %name, requester = %requester.id, "dispatching command");
        let invocation = Invocation {
            connection: Arc::clone(connection),
            requester,
            interaction: event.clone(),
            options,
        };
        match handler.call(invocation).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => {
                error!(command = %name, error = %e, "command handler failed");
                DispatchOutcome::Failed
            }
        }
    }
}

impl Listener for CommandTree {
    fn on_event<'a>(
        &'a self,
        ctx: &'a SessionContext,
        event: &'a PlatformEvent,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let PlatformEvent::Interaction(interaction) = event {
                self.dispatch(&ctx.connection, interaction).await;
            }
        })
    }
}
