//! Circulation service: issue requests and loans

use uuid::Uuid;

use super::trace_refusal;
use crate::{
    error::AppResult,
    models::{
        issue::{BookAvailability, IssueRegistry},
        request::{IssueRequestDetails, RequestEvent},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Raise an issue request on behalf of the calling reader
    pub async fn raise_request(&self, claims: &UserClaims, isbn: &str) -> AppResult<RequestEvent> {
        trace_refusal("raise issue request", claims, claims.require_reader())?;

        let result = self
            .repository
            .requests
            .raise(isbn, &claims.sub, claims.user_id)
            .await;
        let request = trace_refusal("raise issue request", claims, result)?;
        tracing::info!(request_id = %request.request_id, isbn = %isbn, reader_id = %claims.user_id, "Issue request raised");
        Ok(request)
    }

    pub async fn list_requests(&self, claims: &UserClaims) -> AppResult<Vec<IssueRequestDetails>> {
        trace_refusal("list issue requests", claims, claims.require_admin())?;
        self.repository.requests.list_pending(claims.user_id).await
    }

    pub async fn approve_request(&self, claims: &UserClaims, request_id: Uuid) -> AppResult<IssueRegistry> {
        trace_refusal("approve issue request", claims, claims.require_admin())?;

        let result = self.repository.requests.approve(request_id, claims.user_id).await;
        let issue = trace_refusal("approve issue request", claims, result)?;
        tracing::info!(
            request_id = %request_id,
            issue_id = %issue.issue_id,
            isbn = %issue.isbn,
            expected_return_date = %issue.expected_return_date,
            "Issue request approved"
        );
        Ok(issue)
    }

    pub async fn reject_request(&self, claims: &UserClaims, request_id: Uuid) -> AppResult<()> {
        trace_refusal("reject issue request", claims, claims.require_admin())?;

        let result = self.repository.requests.reject(request_id, claims.user_id).await;
        trace_refusal("reject issue request", claims, result)?;
        tracing::info!(request_id = %request_id, "Issue request rejected");
        Ok(())
    }

    pub async fn availability(&self, claims: &UserClaims, isbn: &str) -> AppResult<BookAvailability> {
        trace_refusal("book availability", claims, claims.require_library_member())?;
        let result = self.repository.requests.availability(isbn, claims.user_id).await;
        trace_refusal("book availability", claims, result)
    }
}
