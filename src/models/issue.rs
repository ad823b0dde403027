//! Issue registry: one row per copy lent to a reader

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Loan period granted on approval
pub const LOAN_PERIOD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::Closed => "closed",
        }
    }
}

impl TryFrom<String> for IssueStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "open" => Ok(IssueStatus::Open),
            "closed" => Ok(IssueStatus::Closed),
            _ => Err(format!("Invalid issue status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IssueRegistry {
    pub issue_id: Uuid,
    pub isbn: String,
    pub reader_id: Uuid,
    pub issue_approver_id: Uuid,
    #[sqlx(try_from = "String")]
    pub issue_status: IssueStatus,
    pub issue_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub return_approver_id: Option<Uuid>,
}

impl IssueRegistry {
    /// Open a loan for an approved request
    pub fn open(isbn: String, reader_id: Uuid, approver_id: Uuid, issue_date: DateTime<Utc>) -> Self {
        Self {
            issue_id: Uuid::new_v4(),
            isbn,
            reader_id,
            issue_approver_id: approver_id,
            issue_status: IssueStatus::Open,
            issue_date,
            expected_return_date: issue_date + Duration::days(LOAN_PERIOD_DAYS),
            return_date: None,
            return_approver_id: None,
        }
    }
}

/// Shelf state of one book and when the next copy is due back
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookAvailability {
    pub isbn: String,
    pub available_copies: i32,
    /// Earliest expected return among open loans; `None` when nothing is on loan
    pub next_expected_return: Option<DateTime<Utc>>,
}
