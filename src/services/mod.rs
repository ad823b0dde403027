//! Business logic services
//!
//! Thin layer between the HTTP handlers and the repository: role gates on the
//! verified claims, token issuing and logging of state changes.

pub mod auth;
pub mod circulation;
pub mod inventory;
pub mod libraries;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::UserClaims,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub libraries: libraries::LibrariesService,
    pub inventory: inventory::InventoryService,
    pub circulation: circulation::CirculationService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            libraries: libraries::LibrariesService::new(repository.clone()),
            inventory: inventory::InventoryService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository.clone()),
            repository,
        }
    }

    /// Round trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }
}

/// Log refused operations at debug level and pass the result through.
/// Store failures are left to the HTTP layer, which logs them as errors.
fn trace_refusal<T>(action: &str, claims: &UserClaims, result: AppResult<T>) -> AppResult<T> {
    if let Err(err) = &result {
        match err {
            AppError::Authorization(_)
            | AppError::NotFound(_)
            | AppError::Conflict(_)
            | AppError::Validation(_) => {
                tracing::debug!(user_id = %claims.user_id, role = %claims.role, "{} refused: {}", action, err);
            }
            _ => {}
        }
    }
    result
}
