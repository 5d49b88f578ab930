//! Everything a tenant session runs: its commands, the settings menu, the
//! owner message relay and presence mirroring.

pub mod commands;
pub mod presence;
pub mod settings;

use std::sync::Arc;

use tokio::sync::Mutex;

use synthos_types::config::RelayConfig;
use synthos_types::error::{CommandTreeError, HandlerError};
use synthos_types::platform::EventKind;

use crate::auth::{self, SharedAuthorizer};
use crate::command::Invocation;
use crate::relay::MessageRelay;
use crate::session::{ListenerTable, SessionLabel, SessionSpec};

pub use presence::PresenceMirror;
pub use settings::{SettingsMenu, TenantSettings};

/// State shared by the handlers of one tenant session.
pub struct TenantContext {
    pub owner_id: String,
    pub authorizer: SharedAuthorizer,
    /// Operator named in alerts about failed handlers.
    pub operator: Option<String>,
    /// Volatile; reset whenever the session restarts.
    pub settings: Mutex<TenantSettings>,
}

impl TenantContext {
    pub fn new(
        owner_id: impl Into<String>,
        authorizer: SharedAuthorizer,
        operator: Option<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            authorizer,
            operator,
            settings: Mutex::new(TenantSettings::default()),
        }
    }

    /// See [`auth::gate`].
    pub async fn gate(&self, invocation: &Invocation) -> Result<bool, HandlerError> {
        auth::gate(
            self.authorizer.as_ref(),
            &self.owner_id,
            invocation,
            self.operator.as_deref(),
        )
        .await
    }

    pub fn operator(&self) -> &str {
        self.operator.as_deref().unwrap_or("unset")
    }
}

/// Commands and listeners of the tenant session owned by `owner_id`.
pub fn session_spec(
    owner_id: &str,
    authorizer: SharedAuthorizer,
    relay: RelayConfig,
    operator: Option<String>,
) -> Result<SessionSpec, CommandTreeError> {
    let tenant = Arc::new(TenantContext::new(owner_id, authorizer, operator));
    let commands = commands::tree(Arc::clone(&tenant))?;
    let menu = Arc::new(SettingsMenu::new(tenant));

    let listeners = ListenerTable::new()
        .on(
            EventKind::MessageCreate,
            Arc::new(MessageRelay::new(owner_id, relay)),
        )
        .on(
            EventKind::PresenceUpdate,
            Arc::new(PresenceMirror::new(owner_id)),
        )
        .on(EventKind::ComponentInteraction, menu.clone())
        .on(EventKind::ModalSubmit, menu);

    Ok(SessionSpec {
        label: SessionLabel::Tenant(owner_id.to_string()),
        commands: Arc::new(commands),
        listeners,
    })
}
