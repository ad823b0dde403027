//! Library model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::NewUser;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Library {
    pub id: Uuid,
    pub name: String,
}

/// Library with membership and catalog counts, as listed to its owner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LibraryDetails {
    pub id: Uuid,
    pub name: String,
    pub admin_count: i64,
    pub reader_count: i64,
    pub title_count: i64,
    pub total_copies: i64,
}

/// Create a library for an existing owner
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLibrary {
    #[validate(length(min = 1, max = 200, message = "Library name must be 1 to 200 characters"))]
    pub library_name: String,
}

/// Sign up an owner and create their library in one step
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLibraryWithOwner {
    #[validate(length(min = 1, max = 200, message = "Library name must be 1 to 200 characters"))]
    pub library_name: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub owner: NewUser,
}

/// Onboard an admin into a library
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OnboardAdmin {
    pub library_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub admin: NewUser,
}
