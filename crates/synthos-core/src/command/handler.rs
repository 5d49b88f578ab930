//! Command handlers and the invocation they receive.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use synthos_types::error::HandlerError;
use synthos_types::interaction::{
    CommandOptionValue, InteractionEvent, InteractionReply, ReplyMessage,
};
use synthos_types::platform::User;

use crate::platform::SharedConnection;

/// Everything a handler needs to act on one interaction.
pub struct Invocation {
    pub connection: SharedConnection,
    /// The resolved invoking identity.
    pub requester: User,
    pub interaction: InteractionEvent,
    /// Options for the matched node, in declaration order.
    pub options: Vec<CommandOptionValue>,
}

impl Invocation {
    /// String value of the option at `index`.
    pub fn option_str(&self, index: usize) -> Option<&str> {
        self.options.get(index).and_then(CommandOptionValue::as_str)
    }

    pub async fn respond(&self, reply: InteractionReply) -> Result<(), HandlerError> {
        self.connection.respond(&self.interaction, &reply).await?;
        Ok(())
    }

    /// Reply with plain text; ephemeral when invoked inside a guild.
    pub async fn reply(&self, content: impl Into<String>) -> Result<(), HandlerError> {
        self.respond(InteractionReply::Message(ReplyMessage {
            content: content.into(),
            ephemeral: self.interaction.is_guild(),
            rows: Vec::new(),
        }))
        .await
    }

    /// Acknowledge now and answer later with [`Invocation::edit_reply`].
    pub async fn defer(&self) -> Result<(), HandlerError> {
        self.respond(InteractionReply::Defer {
            ephemeral: self.interaction.is_guild(),
        })
        .await
    }

    pub async fn edit_reply(&self, content: &str) -> Result<(), HandlerError> {
        self.connection
            .edit_reply(&self.interaction, content)
            .await?;
        Ok(())
    }
}

/// A command callback.
///
/// Implemented for every `Fn(Invocation) -> impl Future<Output =
/// Result<(), HandlerError>>`, so plain async closures can be attached.
pub trait Handler: Send + Sync {
    fn call(&self, invocation: Invocation) -> BoxFuture<'static, Result<(), HandlerError>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, invocation: Invocation) -> BoxFuture<'static, Result<(), HandlerError>> {
        Box::pin(self(invocation))
    }
}

pub type SharedHandler = Arc<dyn Handler>;
