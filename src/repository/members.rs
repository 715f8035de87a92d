//! Members repository. Member records are mutated by the surrounding
//! system; circulation only reads them.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::member::Member,
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::MemberNotFound(id))
    }

    /// Count the member's loans currently in the overdue state
    pub async fn count_overdue_loans(&self, member_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE member_id = $1 AND status = $2",
        )
        .bind(member_id)
        .bind(crate::models::loan::LoanStatus::Overdue)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
