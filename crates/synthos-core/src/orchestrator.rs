//! Tenant orchestration.
//!
//! The `Orchestrator` provisions tenants, owns the registry of running
//! sessions (one per owner plus the controller) and brings everything up at
//! boot and down at shutdown. One tenant failing to start never affects the
//! others.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use synthos_types::config::{LifecycleConfig, RelayConfig};
use synthos_types::error::{ConnectionError, RepositoryError, SessionError, TenantError};
use synthos_types::tenant::{TenantRecord, server_link};

use crate::auth::SharedAuthorizer;
use crate::controller::{self, TenantProvisioner};
use crate::platform::{BoxConnection, ConnectionFactory, SharedConnection};
use crate::repository::tenant::TenantRepository;
use crate::session::{ListenerTable, Session, SessionLabel, SessionSpec};
use crate::tenant;

/// Knobs the orchestrator passes on to the sessions it starts.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    pub relay: RelayConfig,
    pub lifecycle: LifecycleConfig,
    /// Operator named in alerts about failed handlers.
    pub admin_id: Option<String>,
}

/// Result of starting every enabled tenant at boot.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub started: Vec<String>,
    pub failed: Vec<String>,
}

/// Result of closing every session at shutdown.
#[derive(Debug, Default)]
pub struct StopReport {
    pub closed: Vec<SessionLabel>,
    pub failed: Vec<(SessionLabel, ConnectionError)>,
}

impl StopReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Default)]
struct Registry {
    controller: Option<Session>,
    tenants: HashMap<String, Session>,
    stopping: bool,
}

pub struct Orchestrator<R, F> {
    repository: R,
    factory: F,
    authorizer: SharedAuthorizer,
    settings: OrchestratorSettings,
    registry: Mutex<Registry>,
}

impl<R, F> Orchestrator<R, F>
where
    R: TenantRepository + 'static,
    F: ConnectionFactory + 'static,
{
    pub fn new(
        repository: R,
        factory: F,
        authorizer: SharedAuthorizer,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            repository,
            factory,
            authorizer,
            settings,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Validate `token` and persist a new tenant for `requester`.
    ///
    /// An existing tenant is reported before the token is looked at.
    pub async fn create_tenant(
        &self,
        requester: &str,
        token: SecretString,
    ) -> Result<TenantRecord, TenantError> {
        if self
            .repository
            .get_by_owner(requester)
            .await
            .map_err(internal)?
            .is_some()
        {
            return Err(TenantError::AlreadyExists);
        }

        let application_id = match self.factory.resolve_application(&token).await {
            Ok(id) => id,
            Err(ConnectionError::Rejected(reason)) => {
                info!(owner_id = %requester, reason = %reason, "tenant credential rejected");
                return Err(TenantError::InvalidCredential);
            }
            Err(ConnectionError::InvalidId(reason)) => {
                info!(owner_id = %requester, reason = %reason, "tenant credential malformed");
                return Err(TenantError::InvalidCredential);
            }
            Err(e) => return Err(TenantError::Internal(e.to_string())),
        };

        let record = TenantRecord::new(requester, application_id, token);
        match self.repository.create(&record).await {
            Ok(()) => {
                info!(owner_id = %requester, tenant_id = %record.id, "tenant created");
                Ok(record)
            }
            Err(RepositoryError::Conflict(_)) => Err(TenantError::AlreadyExists),
            Err(e) => Err(internal(e)),
        }
    }

    pub async fn get_tenant(&self, requester: &str) -> Result<TenantRecord, TenantError> {
        self.repository
            .get_by_owner(requester)
            .await
            .map_err(internal)?
            .ok_or(TenantError::NotFound)
    }

    /// Install link for `requester`'s tenant application.
    pub async fn server_link(&self, requester: &str) -> Result<String, TenantError> {
        let record = self.get_tenant(requester).await?;
        Ok(server_link(&record.application_id))
    }

    /// Start `requester`'s tenant session. A running session is left alone.
    pub async fn start_tenant(&self, requester: &str) -> Result<(), TenantError> {
        if self.registry.lock().await.tenants.contains_key(requester) {
            debug!(owner_id = %requester, "tenant already running");
            return Ok(());
        }
        let record = match self.repository.get_by_owner(requester).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(owner_id = %requester, "no tenant to start");
                return Err(TenantError::UnableToStart);
            }
            Err(e) => {
                error!(owner_id = %requester, error = %e, "failed to load tenant");
                return Err(TenantError::UnableToStart);
            }
        };
        self.start_record(&record).await
    }

    async fn start_record(&self, record: &TenantRecord) -> Result<(), TenantError> {
        let owner = record.owner_id.clone();
        let session = match self.launch_tenant(record).await {
            Ok(session) => session,
            Err(e) => {
                error!(owner_id = %owner, error = %e, "failed to start tenant session");
                return Err(TenantError::UnableToStart);
            }
        };

        let (surplus, stopping) = {
            let mut registry = self.registry.lock().await;
            if registry.stopping {
                (Some(session), true)
            } else if registry.tenants.contains_key(&owner) {
                (Some(session), false)
            } else {
                registry.tenants.insert(owner.clone(), session);
                (None, false)
            }
        };
        if let Some(session) = surplus {
            debug!(owner_id = %owner, stopping, "closing surplus tenant session");
            if let Err(e) = session.close(self.settings.lifecycle.close_timeout()).await {
                warn!(owner_id = %owner, error = %e, "failed to close surplus session");
            }
            if stopping {
                return Err(TenantError::UnableToStart);
            }
        }
        Ok(())
    }

    async fn launch_tenant(&self, record: &TenantRecord) -> Result<Session, SessionError> {
        let spec = tenant::session_spec(
            &record.owner_id,
            Arc::clone(&self.authorizer),
            self.settings.relay.clone(),
            self.settings.admin_id.clone(),
        )?;
        let (connection, events) = self.factory.connect(&record.token)?;
        let connection: SharedConnection = Arc::new(BoxConnection::new(connection));
        Session::start(
            spec,
            connection,
            events,
            self.settings.lifecycle.open_timeout(),
        )
        .await
    }

    /// Start every enabled tenant, skipping the ones that fail.
    ///
    /// Only a failure to list tenants is returned.
    pub async fn bootstrap(&self) -> Result<BootstrapReport, TenantError> {
        let records = self.repository.list_enabled().await.map_err(internal)?;
        info!(count = records.len(), "starting tenants");

        let attempts = records.iter().map(|record| async move {
            let result = self.start_record(record).await;
            (record.owner_id.clone(), result)
        });
        let mut report = BootstrapReport::default();
        for (owner, result) in join_all(attempts).await {
            match result {
                Ok(()) => report.started.push(owner),
                Err(e) => {
                    warn!(owner_id = %owner, error = %e, "skipping tenant");
                    report.failed.push(owner);
                }
            }
        }
        info!(
            started = report.started.len(),
            failed = report.failed.len(),
            "tenant bootstrap finished"
        );
        Ok(report)
    }

    /// Close every session, tenants concurrently and then the controller.
    ///
    /// Each close is bounded by the configured timeout; a failure is recorded
    /// and never stops the others.
    pub async fn stop_all(&self) -> StopReport {
        let (controller, tenants) = {
            let mut registry = self.registry.lock().await;
            registry.stopping = true;
            (
                registry.controller.take(),
                std::mem::take(&mut registry.tenants),
            )
        };
        let timeout = self.settings.lifecycle.close_timeout();
        info!(tenants = tenants.len(), "stopping sessions");

        let closes = tenants.into_values().map(|session| async move {
            let result = session.close(timeout).await;
            (session.label().clone(), result)
        });
        let mut results = join_all(closes).await;
        if let Some(session) = controller {
            let result = session.close(timeout).await;
            results.push((session.label().clone(), result));
        }

        let mut report = StopReport::default();
        for (label, result) in results {
            match result {
                Ok(()) => report.closed.push(label),
                Err(e) => {
                    error!(session = %label, error = %e, "failed to close session");
                    report.failed.push((label, e));
                }
            }
        }
        report
    }

    /// Owners with a running session, sorted.
    pub async fn running_tenants(&self) -> Vec<String> {
        let mut owners: Vec<_> = self.registry.lock().await.tenants.keys().cloned().collect();
        owners.sort();
        owners
    }

    /// Start the controller session on `token`.
    pub async fn start_controller(self: &Arc<Self>, token: &SecretString) -> Result<(), SessionError> {
        let commands = controller::commands(Arc::clone(self))?;
        let spec = SessionSpec {
            label: SessionLabel::Controller,
            commands: Arc::new(commands),
            listeners: ListenerTable::new(),
        };
        let (connection, events) = self.factory.connect(token)?;
        let connection: SharedConnection = Arc::new(BoxConnection::new(connection));
        let session = Session::start(
            spec,
            connection,
            events,
            self.settings.lifecycle.open_timeout(),
        )
        .await?;

        let previous = self.registry.lock().await.controller.replace(session);
        if let Some(previous) = previous {
            warn!("replacing running controller session");
            if let Err(e) = previous.close(self.settings.lifecycle.close_timeout()).await {
                warn!(error = %e, "failed to close previous controller session");
            }
        }
        Ok(())
    }
}

impl<R, F> TenantProvisioner for Orchestrator<R, F>
where
    R: TenantRepository + 'static,
    F: ConnectionFactory + 'static,
{
    async fn create_tenant(&self, requester: &str, token: SecretString) -> Result<(), TenantError> {
        Orchestrator::create_tenant(self, requester, token)
            .await
            .map(|_| ())
    }

    async fn start_tenant(&self, requester: &str) -> Result<(), TenantError> {
        Orchestrator::start_tenant(self, requester).await
    }

    async fn server_link(&self, requester: &str) -> Result<String, TenantError> {
        Orchestrator::server_link(self, requester).await
    }
}

fn internal(e: RepositoryError) -> TenantError {
    TenantError::Internal(e.to_string())
}
