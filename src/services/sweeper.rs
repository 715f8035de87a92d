//! Overdue sweeper: promotes borrowed loans past their due date to
//! overdue and refreshes their fines. Runs as a recurring background job
//! and on demand through the admin endpoints; each invocation is
//! independently idempotent.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{config::CirculationConfig, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct SweeperService {
    repository: Repository,
    circulation: CirculationConfig,
}

impl SweeperService {
    pub fn new(repository: Repository, circulation: CirculationConfig) -> Self {
        Self {
            repository,
            circulation,
        }
    }

    /// Promote borrowed loans whose due date has passed to overdue.
    /// Returns the number of promoted loans.
    pub async fn sweep_overdue(&self, as_of: Option<NaiveDate>) -> AppResult<u64> {
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let swept = self.repository.loans.sweep_overdue(as_of).await?;
        if swept > 0 {
            tracing::info!(count = swept, %as_of, "Loans swept to overdue");
        }
        Ok(swept)
    }

    /// Recompute stored fines for every unreturned overdue loan. Returns
    /// the number of updated loans.
    pub async fn calculate_fines(
        &self,
        fine_per_day: Option<Decimal>,
        as_of: Option<NaiveDate>,
    ) -> AppResult<u64> {
        let per_day = fine_per_day.unwrap_or(self.circulation.fine_per_day);
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let updated = self
            .repository
            .loans
            .refresh_overdue_fines(per_day, as_of)
            .await?;
        if updated > 0 {
            tracing::info!(count = updated, %per_day, "Overdue fines refreshed");
        }
        Ok(updated)
    }

    /// One background pass: sweep, then refresh fines with the configured
    /// rate.
    pub async fn run_once(&self) -> AppResult<(u64, u64)> {
        let swept = self.sweep_overdue(None).await?;
        let fined = self.calculate_fines(None, None).await?;
        Ok((swept, fined))
    }
}
