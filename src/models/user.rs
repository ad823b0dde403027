//! User model, roles and JWT claims

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Role of a user. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Reader => "reader",
        }
    }

    /// Fails with `Authorization` unless `self` is `expected`.
    pub fn require(self, expected: Role) -> Result<(), AppError> {
        if self == expected {
            return Ok(());
        }
        let message = match expected {
            Role::Owner => "Owner privileges required",
            Role::Admin => "Access denied. Provide a valid admin account",
            Role::Reader => "Access denied. Provide a valid reader account",
        };
        Err(AppError::Authorization(message.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "reader" => Ok(Role::Reader),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "contact")]
    pub contact_number: String,
    pub role: Role,
    /// `None` for an owner who has not created a library yet
    pub library_id: Option<Uuid>,
}

/// Contact details shared by every user-creating operation
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(length(min = 3, max = 100, message = "Name must be 3 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 10, max = 15, message = "Contact must be 10 to 15 characters"))]
    pub contact: String,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Email of the user
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        Self::decode(token, secret, true)
    }

    /// Parse a token whose signature is valid, accepting an elapsed expiry.
    /// Only used to reissue tokens.
    pub fn from_expired_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        Self::decode(token, secret, false)
    }

    fn decode(token: &str, secret: &str, validate_exp: bool) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.validate_exp = validate_exp;
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }

    pub fn require_owner(&self) -> Result<(), AppError> {
        self.role.require(Role::Owner)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.role.require(Role::Admin)
    }

    pub fn require_reader(&self) -> Result<(), AppError> {
        self.role.require(Role::Reader)
    }

    /// Admins and readers browse the inventory of their own library
    pub fn require_library_member(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::Reader => Ok(()),
            Role::Owner => Err(AppError::Authorization(
                "Inventory is only visible to library members".to_string(),
            )),
        }
    }
}
