//! Member model. Member records are managed by the surrounding system;
//! circulation only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Membership status codes (stored in members.membership_status)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active = 0,
    Expired = 1,
    Suspended = 2,
}

impl From<i16> for MembershipStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => MembershipStatus::Expired,
            2 => MembershipStatus::Suspended,
            _ => MembershipStatus::Active,
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Expired => "expired",
            MembershipStatus::Suspended => "suspended",
        };
        write!(f, "{}", label)
    }
}

/// Member model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub membership_status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
