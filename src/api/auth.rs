//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{NewUser, User},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reader signup into an existing library
#[derive(Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    pub library_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub reader: NewUser,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub user: User,
}

impl AuthResponse {
    pub fn bearer(token: String, user: User) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            user,
        }
    }
}

/// Passwordless login by email
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid email"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;

    let (token, user) = state.services.auth.login(&request.email).await?;
    Ok(Json(AuthResponse::bearer(token, user)))
}

/// Sign up as a reader of a library
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Reader created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Library not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let (token, user) = state
        .services
        .auth
        .signup_reader(request.reader, request.library_id)
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, user))))
}

/// Exchange a correctly signed token, even an expired one, for a fresh one
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token reissued", body = AuthResponse),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (token, user) = state.services.auth.refresh(&request.token).await?;
    Ok(Json(AuthResponse::bearer(token, user)))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    let user = state.services.auth.me(&claims).await?;
    Ok(Json(user))
}
