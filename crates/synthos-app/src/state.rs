//! Application state wiring the orchestrator to its infra implementations.

use std::sync::Arc;

use synthos_core::auth::{SelfPolicy, SharedAuthorizer};
use synthos_core::orchestrator::{Orchestrator, OrchestratorSettings};
use synthos_infra::discord::SerenityConnectionFactory;
use synthos_infra::sqlite::pool::DatabasePool;
use synthos_infra::sqlite::tenant::SqliteTenantRepository;
use synthos_types::config::SynthosConfig;

/// The orchestrator pinned to SQLite storage and the Discord adapter.
pub type ConcreteOrchestrator = Orchestrator<SqliteTenantRepository, SerenityConnectionFactory>;

pub struct AppState {
    pub config: SynthosConfig,
    pub db_pool: DatabasePool,
    pub orchestrator: Arc<ConcreteOrchestrator>,
}

impl AppState {
    /// Connect the database and build the orchestrator. Nothing is started.
    pub async fn init(config: SynthosConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&config.database.url).await?;

        let settings = OrchestratorSettings {
            relay: config.relay.clone(),
            lifecycle: config.lifecycle,
            admin_id: config.synthos.admin_id.clone(),
        };
        let authorizer: SharedAuthorizer = Arc::new(SelfPolicy);

        let orchestrator = Arc::new(Orchestrator::new(
            SqliteTenantRepository::new(db_pool.clone()),
            SerenityConnectionFactory::new(),
            authorizer,
            settings,
        ));

        Ok(Self {
            config,
            db_pool,
            orchestrator,
        })
    }
}
