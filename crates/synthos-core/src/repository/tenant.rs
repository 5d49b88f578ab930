//! Tenant repository trait definition.

use synthos_types::error::RepositoryError;
use synthos_types::tenant::TenantRecord;

/// Repository trait for tenant persistence.
///
/// Implementations live in synthos-infra (e.g., SqliteTenantRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait TenantRepository: Send + Sync {
    /// Insert a new tenant.
    ///
    /// Returns `RepositoryError::Conflict` when the owner already has a record.
    fn create(
        &self,
        record: &TenantRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the tenant owned by `owner_id`.
    fn get_by_owner(
        &self,
        owner_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<TenantRecord>, RepositoryError>> + Send;

    /// All enabled tenants, oldest first.
    fn list_enabled(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<TenantRecord>, RepositoryError>> + Send;
}
