//! Reader endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{error::AppResult, models::request::RequestEvent, AppState};

use super::AuthenticatedUser;

#[derive(Deserialize, Validate, ToSchema)]
pub struct RaiseRequest {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: String,
}

/// Ask to borrow a book of the reader's library
#[utoipa::path(
    post,
    path = "/reader/requests",
    tag = "reader",
    security(("bearer_auth" = [])),
    request_body = RaiseRequest,
    responses(
        (status = 201, description = "Request raised", body = RequestEvent),
        (status = 403, description = "Reader privileges required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No available copies")
    )
)]
pub async fn raise_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<RaiseRequest>,
) -> AppResult<(StatusCode, Json<RequestEvent>)> {
    request.validate()?;

    let event = state.services.circulation.raise_request(&claims, &request.isbn).await?;
    Ok((StatusCode::CREATED, Json(event)))
}
