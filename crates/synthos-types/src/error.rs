use std::time::Duration;

use thiserror::Error;

/// Errors from repository operations (used by trait definitions in synthos-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by a chat-platform connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection is not open")]
    NotOpen,

    #[error("invalid platform id: '{0}'")]
    InvalidId(String),

    /// The platform refused the credential or the request.
    #[error("rejected by platform: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed")]
    Closed,
}

/// Tenant lifecycle errors surfaced to requesters.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error("invalid credential")]
    InvalidCredential,

    #[error("tenant already exists")]
    AlreadyExists,

    #[error("unable to start tenant")]
    UnableToStart,

    #[error("tenant not found")]
    NotFound,

    /// Persistence or platform failure not meant for the requester.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a session could not be brought up.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Commands(#[from] CommandTreeError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Command tree shape violations, detected when the tree is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandTreeError {
    #[error("command name is required")]
    EmptyName,

    #[error("description is required for '{name}'")]
    EmptyDescription { name: String },

    #[error("'{name}' needs a handler")]
    MissingHandler { name: String },

    #[error("'{name}' must not have both a handler and subcommands")]
    HandlerAndSubcommands { name: String },

    #[error("'{name}' must not have both options and subcommands")]
    OptionsAndSubcommands { name: String },

    #[error("option name is required in '{command}'")]
    EmptyOptionName { command: String },

    #[error("description is required for option '{option}' of '{command}'")]
    EmptyOptionDescription { command: String, option: String },

    #[error("duplicate name '{name}' in {scope}")]
    DuplicateName { scope: String, name: String },
}

/// The authorization policy itself failed.
#[derive(Debug, Error)]
#[error("authorization failed: {0}")]
pub struct AuthorizationError(pub String);

/// Anything a command or listener handler can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("{0}")]
    Other(String),
}
