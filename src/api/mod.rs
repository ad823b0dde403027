//! API handlers for the Libris REST endpoints

pub mod admin;
pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod owner;
pub mod reader;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.services.auth.verify(token)?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        // Owners
        .route("/libraries", post(owner::create_library_with_owner))
        .route("/owner/signup", post(owner::signup))
        .route(
            "/owner/libraries",
            get(owner::list_libraries).post(owner::create_library),
        )
        .route("/owner/libraries/:id/admins", get(owner::list_admins))
        .route("/owner/admins", post(owner::onboard_admin))
        // Admins
        .route("/admin/books", post(admin::add_book))
        .route(
            "/admin/books/:isbn",
            delete(admin::remove_book).put(admin::update_book),
        )
        .route("/admin/requests", get(admin::list_requests))
        .route("/admin/requests/:id/approve", post(admin::approve_request))
        .route("/admin/requests/:id/reject", post(admin::reject_request))
        // Readers
        .route("/reader/requests", post(reader::raise_request))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/:isbn", get(books::get_book))
        .route("/books/:isbn/availability", get(books::get_availability))
        .with_state(state);

    // OpenAPI documentation
    let docs = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(docs)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Token of an `Authorization: Bearer <token>` header
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))
}
