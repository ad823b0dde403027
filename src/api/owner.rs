//! Owner endpoints: libraries and admins

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        library::{CreateLibrary, CreateLibraryWithOwner, Library, LibraryDetails, OnboardAdmin},
        user::{NewUser, User},
    },
    AppState,
};

use super::{auth::AuthResponse, AuthenticatedUser};

#[derive(Serialize, ToSchema)]
pub struct LibraryCreatedResponse {
    pub library: Library,
    #[serde(flatten)]
    pub auth: AuthResponse,
}

/// Sign up as an owner, without a library yet
#[utoipa::path(
    post,
    path = "/owner/signup",
    tag = "owner",
    request_body = NewUser,
    responses(
        (status = 201, description = "Owner created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(owner): Json<NewUser>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    owner.validate()?;

    let owner = state.services.libraries.create_owner(owner).await?;
    let token = state.services.auth.issue_token(&owner)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, owner))))
}

/// Create a library together with its owner account
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "owner",
    request_body = CreateLibraryWithOwner,
    responses(
        (status = 201, description = "Library and owner created", body = LibraryCreatedResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Library name or email already taken")
    )
)]
pub async fn create_library_with_owner(
    State(state): State<AppState>,
    Json(request): Json<CreateLibraryWithOwner>,
) -> AppResult<(StatusCode, Json<LibraryCreatedResponse>)> {
    request.validate()?;

    let (library, owner) = state
        .services
        .libraries
        .create_library_with_owner(&request.library_name, request.owner)
        .await?;
    let token = state.services.auth.issue_token(&owner)?;

    Ok((
        StatusCode::CREATED,
        Json(LibraryCreatedResponse {
            library,
            auth: AuthResponse::bearer(token, owner),
        }),
    ))
}

/// Create the library of the calling owner
#[utoipa::path(
    post,
    path = "/owner/libraries",
    tag = "owner",
    security(("bearer_auth" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = Library),
        (status = 403, description = "Owner privileges required"),
        (status = 409, description = "Name taken or owner already has a library")
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLibrary>,
) -> AppResult<(StatusCode, Json<Library>)> {
    request.validate()?;

    let library = state
        .services
        .libraries
        .create_library(&claims, &request.library_name)
        .await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// List the libraries of the calling owner
#[utoipa::path(
    get,
    path = "/owner/libraries",
    tag = "owner",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owned libraries", body = Vec<LibraryDetails>),
        (status = 403, description = "Owner privileges required")
    )
)]
pub async fn list_libraries(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LibraryDetails>>> {
    let libraries = state.services.libraries.get_libraries(&claims).await?;
    Ok(Json(libraries))
}

/// Onboard an admin into the calling owner's library
#[utoipa::path(
    post,
    path = "/owner/admins",
    tag = "owner",
    security(("bearer_auth" = [])),
    request_body = OnboardAdmin,
    responses(
        (status = 201, description = "Admin created", body = User),
        (status = 403, description = "Owner privileges required"),
        (status = 404, description = "Library not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn onboard_admin(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<OnboardAdmin>,
) -> AppResult<(StatusCode, Json<User>)> {
    request.validate()?;

    let admin = state
        .services
        .libraries
        .onboard_admin(&claims, request.library_id, request.admin)
        .await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// List the admins of one of the calling owner's libraries
#[utoipa::path(
    get,
    path = "/owner/libraries/{id}/admins",
    tag = "owner",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Library ID")
    ),
    responses(
        (status = 200, description = "Admins of the library", body = Vec<User>),
        (status = 403, description = "Owner privileges required"),
        (status = 404, description = "Library not found")
    )
)]
pub async fn list_admins(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(library_id): Path<Uuid>,
) -> AppResult<Json<Vec<User>>> {
    let admins = state.services.libraries.get_admins(&claims, library_id).await?;
    Ok(Json(admins))
}
