//! Admin endpoints: inventory ledger and issue request approval

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, BookInventory},
        issue::IssueRegistry,
        request::IssueRequestDetails,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Descriptive fields replaced by an update; the ISBN comes from the path
#[derive(Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: String,
    pub authors: String,
    pub publisher: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct RemoveBookResponse {
    pub isbn: String,
    /// Remaining inventory; absent once the last copy is removed
    pub remaining: Option<BookInventory>,
}

/// Add one copy of a book
#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookDetails,
    responses(
        (status = 201, description = "Copy added", body = BookInventory),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 409, description = "ISBN registered in another library")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<BookDetails>,
) -> AppResult<(StatusCode, Json<BookInventory>)> {
    book.validate()?;

    let book = state.services.inventory.add_book(&claims, book).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Remove one copy of a book
#[utoipa::path(
    delete,
    path = "/admin/books/{isbn}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "Book ISBN")
    ),
    responses(
        (status = 200, description = "Copy removed", body = RemoveBookResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Every copy is issued")
    )
)]
pub async fn remove_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<RemoveBookResponse>> {
    let remaining = state.services.inventory.remove_book(&claims, &isbn).await?;
    Ok(Json(RemoveBookResponse { isbn, remaining }))
}

/// Update the descriptive fields of a book
#[utoipa::path(
    put,
    path = "/admin/books/{isbn}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "Book ISBN")
    ),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookInventory),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(isbn): Path<String>,
    Json(update): Json<UpdateBookRequest>,
) -> AppResult<Json<BookInventory>> {
    let book = BookDetails {
        isbn,
        title: update.title,
        authors: update.authors,
        publisher: update.publisher,
        version: update.version,
    };
    book.validate()?;

    let book = state.services.inventory.update_book(&claims, book).await?;
    Ok(Json(book))
}

/// List pending issue requests of the admin's library
#[utoipa::path(
    get,
    path = "/admin/requests",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending requests, oldest first", body = Vec<IssueRequestDetails>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<IssueRequestDetails>>> {
    let requests = state.services.circulation.list_requests(&claims).await?;
    Ok(Json(requests))
}

/// Approve an issue request and open the loan
#[utoipa::path(
    post,
    path = "/admin/requests/{id}/approve",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request approved", body = IssueRegistry),
        (status = 404, description = "Request not found"),
        (status = 409, description = "No available copies or already approved")
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<IssueRegistry>> {
    let issue = state.services.circulation.approve_request(&claims, request_id).await?;
    Ok(Json(issue))
}

/// Reject (delete) a pending issue request
#[utoipa::path(
    post,
    path = "/admin/requests/{id}/reject",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 204, description = "Request rejected"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already approved")
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.circulation.reject_request(&claims, request_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
