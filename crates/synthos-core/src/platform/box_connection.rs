//! BoxConnection: object-safe dynamic dispatch wrapper for Connection.
//!
//! 1. `ConnectionDyn` mirrors `Connection` with boxed futures
//! 2. Blanket-impl `ConnectionDyn` for all `T: Connection`
//! 3. `BoxConnection` wraps `Box<dyn ConnectionDyn>` and delegates

use std::sync::Arc;

use futures_util::future::BoxFuture;

use synthos_types::command::CommandSpec;
use synthos_types::error::ConnectionError;
use synthos_types::interaction::{InteractionEvent, InteractionReply};
use synthos_types::platform::{Message, OutgoingMessage, Presence, SessionInfo, User};

use super::connection::Connection;

/// A connection shared by a session's worker and its handlers.
pub type SharedConnection = Arc<BoxConnection>;

/// Object-safe version of [`Connection`] with boxed futures.
pub trait ConnectionDyn: Send + Sync {
    fn open_boxed(&self) -> BoxFuture<'_, Result<SessionInfo, ConnectionError>>;

    fn close_boxed(&self) -> BoxFuture<'_, Result<(), ConnectionError>>;

    fn register_commands_boxed<'a>(
        &'a self,
        payload: &'a [CommandSpec],
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;

    fn delete_all_commands_boxed(&self) -> BoxFuture<'_, Result<usize, ConnectionError>>;

    fn respond_boxed<'a>(
        &'a self,
        interaction: &'a InteractionEvent,
        reply: &'a InteractionReply,
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;

    fn edit_reply_boxed<'a>(
        &'a self,
        interaction: &'a InteractionEvent,
        content: &'a str,
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;

    fn send_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message: &'a OutgoingMessage,
    ) -> BoxFuture<'a, Result<Message, ConnectionError>>;

    fn edit_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        content: &'a str,
    ) -> BoxFuture<'a, Result<Message, ConnectionError>>;

    fn delete_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;

    fn fetch_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<Message, ConnectionError>>;

    fn update_presence_boxed<'a>(
        &'a self,
        presence: &'a Presence,
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;

    fn current_nickname_boxed<'a>(
        &'a self,
        guild_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, ConnectionError>>;

    fn set_nickname_boxed<'a>(
        &'a self,
        guild_id: &'a str,
        nickname: &'a str,
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;

    fn update_avatar_boxed<'a>(
        &'a self,
        source: &'a User,
    ) -> BoxFuture<'a, Result<(), ConnectionError>>;
}

impl<T: Connection> ConnectionDyn for T {
    fn open_boxed(&self) -> BoxFuture<'_, Result<SessionInfo, ConnectionError>> {
        Box::pin(self.open())
    }

    fn close_boxed(&self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        Box::pin(self.close())
    }

    fn register_commands_boxed<'a>(
        &'a self,
        payload: &'a [CommandSpec],
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.register_commands(payload))
    }

    fn delete_all_commands_boxed(&self) -> BoxFuture<'_, Result<usize, ConnectionError>> {
        Box::pin(self.delete_all_commands())
    }

    fn respond_boxed<'a>(
        &'a self,
        interaction: &'a InteractionEvent,
        reply: &'a InteractionReply,
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.respond(interaction, reply))
    }

    fn edit_reply_boxed<'a>(
        &'a self,
        interaction: &'a InteractionEvent,
        content: &'a str,
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.edit_reply(interaction, content))
    }

    fn send_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message: &'a OutgoingMessage,
    ) -> BoxFuture<'a, Result<Message, ConnectionError>> {
        Box::pin(self.send_message(channel_id, message))
    }

    fn edit_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        content: &'a str,
    ) -> BoxFuture<'a, Result<Message, ConnectionError>> {
        Box::pin(self.edit_message(channel_id, message_id, content))
    }

    fn delete_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.delete_message(channel_id, message_id))
    }

    fn fetch_message_boxed<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, Result<Message, ConnectionError>> {
        Box::pin(self.fetch_message(channel_id, message_id))
    }

    fn update_presence_boxed<'a>(
        &'a self,
        presence: &'a Presence,
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.update_presence(presence))
    }

    fn current_nickname_boxed<'a>(
        &'a self,
        guild_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, ConnectionError>> {
        Box::pin(self.current_nickname(guild_id))
    }

    fn set_nickname_boxed<'a>(
        &'a self,
        guild_id: &'a str,
        nickname: &'a str,
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.set_nickname(guild_id, nickname))
    }

    fn update_avatar_boxed<'a>(
        &'a self,
        source: &'a User,
    ) -> BoxFuture<'a, Result<(), ConnectionError>> {
        Box::pin(self.update_avatar(source))
    }
}

/// Type-erased connection.
///
/// `Connection` uses RPITIT and cannot be a trait object; sessions and
/// handlers hold this instead so they stay independent of the adapter type.
pub struct BoxConnection {
    inner: Box<dyn ConnectionDyn>,
}

impl BoxConnection {
    pub fn new<T: Connection + 'static>(connection: T) -> Self {
        Self {
            inner: Box::new(connection),
        }
    }

    pub async fn open(&self) -> Result<SessionInfo, ConnectionError> {
        self.inner.open_boxed().await
    }

    pub async fn close(&self) -> Result<(), ConnectionError> {
        self.inner.close_boxed().await
    }

    pub async fn register_commands(&self, payload: &[CommandSpec]) -> Result<(), ConnectionError> {
        self.inner.register_commands_boxed(payload).await
    }

    pub async fn delete_all_commands(&self) -> Result<usize, ConnectionError> {
        self.inner.delete_all_commands_boxed().await
    }

    pub async fn respond(
        &self,
        interaction: &InteractionEvent,
        reply: &InteractionReply,
    ) -> Result<(), ConnectionError> {
        self.inner.respond_boxed(interaction, reply).await
    }

    pub async fn edit_reply(
        &self,
        interaction: &InteractionEvent,
        content: &str,
    ) -> Result<(), ConnectionError> {
        self.inner.edit_reply_boxed(interaction, content).await
    }

    pub async fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<Message, ConnectionError> {
        self.inner.send_message_boxed(channel_id, message).await
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ConnectionError> {
        self.inner
            .edit_message_boxed(channel_id, message_id, content)
            .await
    }

    pub async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), ConnectionError> {
        self.inner.delete_message_boxed(channel_id, message_id).await
    }

    pub async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Message, ConnectionError> {
        self.inner.fetch_message_boxed(channel_id, message_id).await
    }

    pub async fn update_presence(&self, presence: &Presence) -> Result<(), ConnectionError> {
        self.inner.update_presence_boxed(presence).await
    }

    pub async fn current_nickname(&self, guild_id: &str) -> Result<Option<String>, ConnectionError> {
        self.inner.current_nickname_boxed(guild_id).await
    }

    pub async fn set_nickname(&self, guild_id: &str, nickname: &str) -> Result<(), ConnectionError> {
        self.inner.set_nickname_boxed(guild_id, nickname).await
    }

    pub async fn update_avatar(&self, source: &User) -> Result<(), ConnectionError> {
        self.inner.update_avatar_boxed(source).await
    }
}
