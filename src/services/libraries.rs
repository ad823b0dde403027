//! Library ownership service

use uuid::Uuid;

use super::trace_refusal;
use crate::{
    error::AppResult,
    models::{
        library::{Library, LibraryDetails},
        user::{NewUser, User, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LibrariesService {
    repository: Repository,
}

impl LibrariesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Sign up an owner who will create their library later
    pub async fn create_owner(&self, owner: NewUser) -> AppResult<User> {
        let owner = self.repository.libraries.create_owner(owner).await?;
        tracing::info!(user_id = %owner.id, "Owner signed up");
        Ok(owner)
    }

    /// Sign up an owner together with their library
    pub async fn create_library_with_owner(
        &self,
        library_name: &str,
        owner: NewUser,
    ) -> AppResult<(Library, User)> {
        let (library, owner) = self
            .repository
            .libraries
            .create_library_with_owner(library_name, owner)
            .await?;
        tracing::info!(library_id = %library.id, user_id = %owner.id, "Library created with its owner");
        Ok((library, owner))
    }

    pub async fn create_library(&self, claims: &UserClaims, library_name: &str) -> AppResult<Library> {
        trace_refusal("create library", claims, claims.require_owner())?;

        let result = self.repository.libraries.create_library(claims.user_id, library_name).await;
        let library = trace_refusal("create library", claims, result)?;
        tracing::info!(library_id = %library.id, user_id = %claims.user_id, "Library created");
        Ok(library)
    }

    pub async fn onboard_admin(&self, claims: &UserClaims, library_id: Uuid, admin: NewUser) -> AppResult<User> {
        trace_refusal("onboard admin", claims, claims.require_owner())?;

        let result = self
            .repository
            .libraries
            .onboard_admin(claims.user_id, library_id, admin)
            .await;
        let admin = trace_refusal("onboard admin", claims, result)?;
        tracing::info!(user_id = %admin.id, library_id = %library_id, "Admin onboarded");
        Ok(admin)
    }

    pub async fn get_libraries(&self, claims: &UserClaims) -> AppResult<Vec<LibraryDetails>> {
        trace_refusal("list libraries", claims, claims.require_owner())?;
        self.repository.libraries.get_libraries(claims.user_id).await
    }

    pub async fn get_admins(&self, claims: &UserClaims, library_id: Uuid) -> AppResult<Vec<User>> {
        trace_refusal("list admins", claims, claims.require_owner())?;
        let result = self.repository.libraries.get_admins(claims.user_id, library_id).await;
        trace_refusal("list admins", claims, result)
    }
}
