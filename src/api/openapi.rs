//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, books, health, owner, reader};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library management REST API: libraries, inventory and issue requests"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::refresh,
        auth::me,
        // Owner
        owner::signup,
        owner::create_library_with_owner,
        owner::create_library,
        owner::list_libraries,
        owner::onboard_admin,
        owner::list_admins,
        // Admin
        admin::add_book,
        admin::remove_book,
        admin::update_book,
        admin::list_requests,
        admin::approve_request,
        admin::reject_request,
        // Reader
        reader::raise_request,
        // Books
        books::list_books,
        books::get_book,
        books::get_availability,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::RefreshRequest,
            auth::AuthResponse,
            // Users and libraries
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::NewUser,
            crate::models::library::Library,
            crate::models::library::LibraryDetails,
            crate::models::library::CreateLibrary,
            crate::models::library::CreateLibraryWithOwner,
            crate::models::library::OnboardAdmin,
            owner::LibraryCreatedResponse,
            // Books
            crate::models::book::BookInventory,
            crate::models::book::BookDetails,
            crate::models::book::SearchField,
            crate::models::issue::BookAvailability,
            books::BookQuery,
            admin::UpdateBookRequest,
            admin::RemoveBookResponse,
            // Requests and loans
            crate::models::request::RequestType,
            crate::models::request::RequestEvent,
            crate::models::request::IssueRequestDetails,
            crate::models::issue::IssueStatus,
            crate::models::issue::IssueRegistry,
            reader::RaiseRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "owner", description = "Library and admin management"),
        (name = "admin", description = "Inventory and issue request approval"),
        (name = "reader", description = "Issue requests"),
        (name = "books", description = "Catalog search")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
