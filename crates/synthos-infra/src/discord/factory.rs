//! `ConnectionFactory` for Discord.

use secrecy::{ExposeSecret, SecretString};
use serenity::all::GatewayIntents;
use serenity::http::Http;
use tokio::sync::mpsc;

use synthos_core::platform::connection::ConnectionFactory;
use synthos_types::error::ConnectionError;
use synthos_types::platform::PlatformEvent;

use super::connection::{SerenityConnection, default_intents};
use super::map_error;

/// Buffered gateway events per session before the bridge applies backpressure.
const EVENT_BUFFER: usize = 256;

pub struct SerenityConnectionFactory {
    intents: GatewayIntents,
    avatars: reqwest::Client,
}

impl SerenityConnectionFactory {
    pub fn new() -> Self {
        Self {
            intents: default_intents(),
            avatars: reqwest::Client::new(),
        }
    }
}

impl Default for SerenityConnectionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionFactory for SerenityConnectionFactory {
    type Connection = SerenityConnection;

    fn connect(
        &self,
        token: &SecretString,
    ) -> Result<(SerenityConnection, mpsc::Receiver<PlatformEvent>), ConnectionError> {
        if token.expose_secret().trim().is_empty() {
            return Err(ConnectionError::Rejected("empty token".to_string()));
        }
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let connection = SerenityConnection::new(token, self.intents, tx, self.avatars.clone());
        Ok((connection, rx))
    }

    async fn resolve_application(&self, token: &SecretString) -> Result<String, ConnectionError> {
        if token.expose_secret().trim().is_empty() {
            return Err(ConnectionError::Rejected("empty token".to_string()));
        }
        let http = Http::new(token.expose_secret());
        let info = http
            .get_current_application_info()
            .await
            .map_err(map_error)?;
        Ok(info.id.to_string())
    }
}
