//! Issue request events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Kind of request a reader raises. Only issues exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Issue,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Issue => "issue",
        }
    }
}

impl TryFrom<String> for RequestType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "issue" => Ok(RequestType::Issue),
            _ => Err(format!("Invalid request type: {}", s)),
        }
    }
}

/// Request lifecycle. Rejected requests are deleted, so they have no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestEvent {
    pub request_id: Uuid,
    /// ISBN of the requested book
    pub book_id: String,
    pub reader_id: Uuid,
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approver_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub request_type: RequestType,
}

impl RequestEvent {
    pub fn pending(book_id: String, reader_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            book_id,
            reader_id,
            request_date: now,
            approval_date: None,
            approver_id: None,
            request_type: RequestType::Issue,
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self.approver_id {
            None => RequestStatus::Pending,
            Some(_) => RequestStatus::Approved,
        }
    }

    /// Approval and rejection only apply to pending requests
    pub fn ensure_pending(&self) -> AppResult<()> {
        match self.status() {
            RequestStatus::Pending => Ok(()),
            RequestStatus::Approved => Err(AppError::Conflict(format!(
                "Issue request {} is already approved",
                self.request_id
            ))),
        }
    }
}

/// Pending request joined with its book, as listed to admins
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IssueRequestDetails {
    pub request_id: Uuid,
    pub isbn: String,
    pub reader_id: Uuid,
    pub request_date: DateTime<Utc>,
    pub book_title: String,
    pub available_copies: i32,
}
