//! Discord connection adapter built on serenity.
//!
//! `SerenityConnectionFactory` hands out `SerenityConnection`s, each owning
//! one gateway client. Gateway events are converted into `PlatformEvent`s
//! by the `EventBridge` and pushed onto the session's channel; outbound
//! calls go straight through serenity's HTTP client.

pub mod connection;
pub mod convert;
pub mod factory;
pub mod handler;

pub use connection::SerenityConnection;
pub use factory::SerenityConnectionFactory;

use synthos_types::error::ConnectionError;

/// Map a serenity failure onto the platform-neutral error.
///
/// Anything Discord answered with an error body, or an authentication
/// refusal on the gateway, is a rejection; the rest is transport trouble.
pub(crate) fn map_error(err: serenity::Error) -> ConnectionError {
    use serenity::gateway::GatewayError;
    use serenity::http::HttpError;

    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => ConnectionError::Rejected(
            format!("{} ({})", response.error.message, response.status_code),
        ),
        serenity::Error::Gateway(GatewayError::InvalidAuthentication) => {
            ConnectionError::Rejected("invalid authentication".to_string())
        }
        other => ConnectionError::Transport(other.to_string()),
    }
}

/// Parse a snowflake id. Discord ids are never zero.
pub(crate) fn snowflake(raw: &str) -> Result<u64, ConnectionError> {
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ConnectionError::InvalidId(raw.to_string())),
    }
}
