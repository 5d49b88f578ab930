//! Connection and ConnectionFactory trait definitions.

use secrecy::SecretString;
use tokio::sync::mpsc;

use synthos_types::command::CommandSpec;
use synthos_types::error::ConnectionError;
use synthos_types::interaction::{InteractionEvent, InteractionReply};
use synthos_types::platform::{Message, OutgoingMessage, PlatformEvent, Presence, SessionInfo, User};

/// One authenticated link to the chat platform.
///
/// Identifiers are passed as strings; adapters reject ones they cannot
/// parse with `ConnectionError::InvalidId`.
pub trait Connection: Send + Sync {
    /// Open the gateway and wait until the platform reports ready.
    fn open(&self) -> impl std::future::Future<Output = Result<SessionInfo, ConnectionError>> + Send;

    fn close(&self) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    /// Replace every global command of this application with `payload`.
    fn register_commands(
        &self,
        payload: &[CommandSpec],
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    /// Delete every global command; returns how many were removed.
    fn delete_all_commands(
        &self,
    ) -> impl std::future::Future<Output = Result<usize, ConnectionError>> + Send;

    fn respond(
        &self,
        interaction: &InteractionEvent,
        reply: &InteractionReply,
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    /// Fill in a deferred reply.
    fn edit_reply(
        &self,
        interaction: &InteractionEvent,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> impl std::future::Future<Output = Result<Message, ConnectionError>> + Send;

    fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Message, ConnectionError>> + Send;

    fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl std::future::Future<Output = Result<Message, ConnectionError>> + Send;

    /// Set the presence of this connection's own identity.
    fn update_presence(
        &self,
        presence: &Presence,
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    /// Nickname of this connection's identity in `guild_id`, if one is set.
    fn current_nickname(
        &self,
        guild_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, ConnectionError>> + Send;

    fn set_nickname(
        &self,
        guild_id: &str,
        nickname: &str,
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;

    /// Copy `source`'s avatar onto this connection's identity.
    fn update_avatar(
        &self,
        source: &User,
    ) -> impl std::future::Future<Output = Result<(), ConnectionError>> + Send;
}

/// Creates connections from credentials.
pub trait ConnectionFactory: Send + Sync {
    type Connection: Connection + 'static;

    /// Build an unopened connection plus the receiver its events arrive on.
    fn connect(
        &self,
        token: &SecretString,
    ) -> Result<(Self::Connection, mpsc::Receiver<PlatformEvent>), ConnectionError>;

    /// Check a credential with one lightweight call and return the
    /// application id it belongs to. Nothing is kept open.
    fn resolve_application(
        &self,
        token: &SecretString,
    ) -> impl std::future::Future<Output = Result<String, ConnectionError>> + Send;
}
