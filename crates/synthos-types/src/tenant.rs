use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a tenant record, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    /// Create a new TenantId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A provisioned tenant: one owner, one platform application, one credential.
///
/// At most one record exists per `owner_id`; the storage layer enforces this
/// with a uniqueness constraint. The credential never shows up in `Debug`.
#[derive(Debug)]
pub struct TenantRecord {
    pub id: TenantId,
    /// The account this tenant relays messages for.
    pub owner_id: String,
    /// Application identity bound to `token`.
    pub application_id: String,
    pub token: SecretString,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantRecord {
    /// Build a fresh, enabled record stamped with the current time.
    pub fn new(
        owner_id: impl Into<String>,
        application_id: impl Into<String>,
        token: SecretString,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::new(),
            owner_id: owner_id.into(),
            application_id: application_id.into(),
            token,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Link a server admin follows to install this tenant's application.
    pub fn server_link(&self) -> String {
        server_link(&self.application_id)
    }
}

impl Clone for TenantRecord {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            application_id: self.application_id.clone(),
            token: SecretString::from(self.token.expose_secret().to_owned()),
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// OAuth2 install link for an application.
///
/// ```
/// use synthos_types::tenant::server_link;
///
/// assert_eq!(
///     server_link("42"),
///     "https://discord.com/oauth2/authorize?client_id=42"
/// );
/// ```
pub fn server_link(application_id: &str) -> String {
    format!("https://discord.com/oauth2/authorize?client_id={application_id}")
}
