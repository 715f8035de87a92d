//! Business logic services

pub mod catalog;
pub mod loans;
pub mod sweeper;

use crate::{config::CirculationConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sweeper: sweeper::SweeperService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, circulation: CirculationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), circulation.clone()),
            sweeper: sweeper::SweeperService::new(repository.clone(), circulation),
            repository,
        }
    }

    /// Round-trip a trivial query so readiness reflects the pool's health.
    pub async fn ping_database(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.repository.pool)
            .await?;
        Ok(())
    }
}
