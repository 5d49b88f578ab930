//! serenity-backed `Connection`.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serenity::all::{
    ChannelId, Client, Command, CreateAttachment, EditInteractionResponse, EditMessage,
    EditProfile, GatewayIntents, GuildId, InteractionId, MessageId, ShardManager, UserId,
};
use serenity::http::Http;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};

use synthos_core::platform::connection::Connection;
use synthos_types::command::CommandSpec;
use synthos_types::error::ConnectionError;
use synthos_types::interaction::{InteractionEvent, InteractionReply};
use synthos_types::platform::{
    Message, OutgoingMessage, PlatformEvent, Presence, SessionInfo, User,
};

use super::handler::EventBridge;
use super::{convert, map_error, snowflake};

const AVATAR_CDN: &str = "https://cdn.discordapp.com/avatars";

/// Gateway intents every session needs: guild and direct messages with
/// their content, plus presence updates for mirroring.
pub fn default_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_PRESENCES
}

/// CDN location of a user's avatar. Animated hashes are prefixed `a_`.
pub fn avatar_url(user_id: &str, hash: &str) -> String {
    let ext = if hash.starts_with("a_") { "gif" } else { "png" };
    format!("{AVATAR_CDN}/{user_id}/{hash}.{ext}?size=1024")
}

type RunnerHandle = JoinHandle<Result<(), serenity::Error>>;

/// A running gateway client.
struct Gateway {
    shard_manager: Arc<ShardManager>,
    runner: RunnerHandle,
    /// Set once the gateway has reported ready.
    info: Option<SessionInfo>,
}

impl Gateway {
    async fn shutdown(self) {
        self.shard_manager.shutdown_all().await;
        match self.runner.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "gateway client ended with error"),
            Err(e) => tracing::debug!(error = %e, "gateway task failed"),
        }
    }
}

fn runner_error(finished: Result<Result<(), serenity::Error>, JoinError>) -> ConnectionError {
    match finished {
        Ok(Ok(())) => ConnectionError::Closed,
        Ok(Err(e)) => map_error(e),
        Err(e) => ConnectionError::Transport(e.to_string()),
    }
}

/// One bot identity on Discord.
///
/// REST calls use a standalone HTTP client created with the connection, so
/// they work before `open`. The gateway client lives only between `open`
/// and `close`.
pub struct SerenityConnection {
    token: SecretString,
    intents: GatewayIntents,
    http: Arc<Http>,
    events: mpsc::Sender<PlatformEvent>,
    avatars: reqwest::Client,
    gateway: Mutex<Option<Gateway>>,
}

impl SerenityConnection {
    pub fn new(
        token: &SecretString,
        intents: GatewayIntents,
        events: mpsc::Sender<PlatformEvent>,
        avatars: reqwest::Client,
    ) -> Self {
        Self {
            token: SecretString::from(token.expose_secret().to_string()),
            intents,
            http: Arc::new(Http::new(token.expose_secret())),
            events,
            avatars,
            gateway: Mutex::new(None),
        }
    }

    async fn own_user_id(&self) -> Result<UserId, ConnectionError> {
        let slot = self.gateway.lock().await;
        let info = slot
            .as_ref()
            .and_then(|g| g.info.as_ref())
            .ok_or(ConnectionError::NotOpen)?;
        Ok(UserId::new(snowflake(&info.user_id)?))
    }

    async fn download_avatar(&self, url: &str) -> Result<Vec<u8>, ConnectionError> {
        let response = self
            .avatars
            .get(url)
            .send()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Connection for SerenityConnection {
    async fn open(&self) -> Result<SessionInfo, ConnectionError> {
        let mut slot = self.gateway.lock().await;
        if let Some(info) = slot.as_ref().and_then(|g| g.info.clone()) {
            return Ok(info);
        }
        if let Some(stale) = slot.take() {
            stale.shutdown().await;
        }

        let (ready_tx, mut ready_rx) = oneshot::channel();
        let bridge = EventBridge::new(self.events.clone(), ready_tx);
        let mut client = Client::builder(self.token.expose_secret(), self.intents)
            .event_handler(bridge)
            .await
            .map_err(map_error)?;

        let shard_manager = Arc::clone(&client.shard_manager);
        let runner = tokio::spawn(async move { client.start().await });

        // Registered before waiting so that a caller giving up on `open`
        // can still `close` the half-started client.
        let gateway = slot.insert(Gateway {
            shard_manager,
            runner,
            info: None,
        });

        let outcome = tokio::select! {
            ready = &mut ready_rx => Ok(ready),
            finished = &mut gateway.runner => Err(finished),
        };

        match outcome {
            Ok(Ok(info)) => {
                gateway.info = Some(info.clone());
                Ok(info)
            }
            // The bridge was dropped, so the client is on its way out.
            Ok(Err(_)) => {
                let finished = (&mut gateway.runner).await;
                *slot = None;
                Err(runner_error(finished))
            }
            Err(finished) => {
                *slot = None;
                Err(runner_error(finished))
            }
        }
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        let gateway = self.gateway.lock().await.take();
        if let Some(gateway) = gateway {
            gateway.shutdown().await;
        }
        Ok(())
    }

    async fn register_commands(&self, payload: &[CommandSpec]) -> Result<(), ConnectionError> {
        Command::set_global_commands(self.http.as_ref(), convert::commands(payload))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn delete_all_commands(&self) -> Result<usize, ConnectionError> {
        let existing = Command::get_global_commands(self.http.as_ref())
            .await
            .map_err(map_error)?;
        Command::set_global_commands(self.http.as_ref(), Vec::new())
            .await
            .map_err(map_error)?;
        Ok(existing.len())
    }

    async fn respond(
        &self,
        interaction: &InteractionEvent,
        reply: &InteractionReply,
    ) -> Result<(), ConnectionError> {
        let id = InteractionId::new(snowflake(&interaction.id)?);
        self.http
            .create_interaction_response(
                id,
                &interaction.token,
                &convert::interaction_response(reply),
                Vec::new(),
            )
            .await
            .map_err(map_error)
    }

    async fn edit_reply(
        &self,
        interaction: &InteractionEvent,
        content: &str,
    ) -> Result<(), ConnectionError> {
        self.http
            .edit_original_interaction_response(
                &interaction.token,
                &EditInteractionResponse::new().content(content),
                Vec::new(),
            )
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<Message, ConnectionError> {
        let channel = ChannelId::new(snowflake(channel_id)?);
        let builder = convert::create_message(message)?;
        let sent = channel
            .send_message(&*self.http, builder)
            .await
            .map_err(map_error)?;
        Ok(convert::message(&sent))
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ConnectionError> {
        let channel = ChannelId::new(snowflake(channel_id)?);
        let message_id = MessageId::new(snowflake(message_id)?);
        let edited = channel
            .edit_message(&*self.http, message_id, EditMessage::new().content(content))
            .await
            .map_err(map_error)?;
        Ok(convert::message(&edited))
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ConnectionError> {
        let channel = ChannelId::new(snowflake(channel_id)?);
        let message_id = MessageId::new(snowflake(message_id)?);
        channel
            .delete_message(&*self.http, message_id)
            .await
            .map_err(map_error)
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Message, ConnectionError> {
        let channel = ChannelId::new(snowflake(channel_id)?);
        let message_id = MessageId::new(snowflake(message_id)?);
        let fetched = channel
            .message(&*self.http, message_id)
            .await
            .map_err(map_error)?;
        Ok(convert::message(&fetched))
    }

    async fn update_presence(&self, presence: &Presence) -> Result<(), ConnectionError> {
        let slot = self.gateway.lock().await;
        let gateway = slot.as_ref().ok_or(ConnectionError::NotOpen)?;

        let activity = presence.activity.as_ref().map(convert::activity_data);
        let status = convert::online_status(presence.status);
        let runners = gateway.shard_manager.runners.lock().await;
        for info in runners.values() {
            info.runner_tx.set_presence(activity.clone(), status);
        }
        Ok(())
    }

    async fn current_nickname(&self, guild_id: &str) -> Result<Option<String>, ConnectionError> {
        let guild = GuildId::new(snowflake(guild_id)?);
        let me = self.own_user_id().await?;
        let member = guild.member(&*self.http, me).await.map_err(map_error)?;
        Ok(member.nick)
    }

    async fn set_nickname(&self, guild_id: &str, nickname: &str) -> Result<(), ConnectionError> {
        let guild = GuildId::new(snowflake(guild_id)?);
        guild
            .edit_nickname(self.http.as_ref(), Some(nickname))
            .await
            .map_err(map_error)
    }

    async fn update_avatar(&self, source: &User) -> Result<(), ConnectionError> {
        let hash = source.avatar.as_deref().ok_or_else(|| {
            ConnectionError::Rejected(format!("user '{}' has no avatar", source.id))
        })?;
        let bytes = self.download_avatar(&avatar_url(&source.id, hash)).await?;
        let attachment = CreateAttachment::bytes(bytes, "avatar.png");

        let mut me = self.http.get_current_user().await.map_err(map_error)?;
        me.edit(&*self.http, EditProfile::new().avatar(&attachment))
            .await
            .map_err(map_error)?;
        tracing::info!(source = %source.id, "avatar updated");
        Ok(())
    }
}
