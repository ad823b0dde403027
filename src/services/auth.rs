//! Authentication service: passwordless login, reader signup and tokens

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{NewUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Look up a user by email and issue a token for them
    pub async fn login(&self, email: &str) -> AppResult<(String, User)> {
        let user = match self.repository.users.login(email).await {
            Ok(user) => user,
            Err(AppError::NotFound(msg)) => {
                tracing::debug!("Login refused for unknown email");
                return Err(AppError::NotFound(msg));
            }
            Err(e) => return Err(e),
        };

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok((token, user))
    }

    /// Register a reader in an existing library and log them in
    pub async fn signup_reader(&self, reader: NewUser, library_id: Uuid) -> AppResult<(String, User)> {
        let user = self.repository.users.signup_reader(reader, library_id).await?;
        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, library_id = %library_id, "Reader signed up");
        Ok((token, user))
    }

    /// Current user, as named by verified claims
    pub async fn me(&self, claims: &UserClaims) -> AppResult<User> {
        self.repository.users.get_by_id(claims.user_id).await
    }

    /// Reissue a token. The old token may be expired but must be correctly signed,
    /// and its user must still exist.
    pub async fn refresh(&self, token: &str) -> AppResult<(String, User)> {
        let claims = UserClaims::from_expired_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))?;

        let user = self.repository.users.get_by_id(claims.user_id).await?;
        let token = self.issue_token(&user)?;
        tracing::debug!(user_id = %user.id, "Token refreshed");
        Ok((token, user))
    }

    /// Sign a token for `user`
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a bearer token
    pub fn verify(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }
}
