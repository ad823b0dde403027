//! Access scoping
//!
//! Resolves the acting user's library from their user row (locked read) so that
//! every later query of the transaction can be filtered by it. Resources outside the
//! caller's library are reported as `NotFound`, never as `Authorization`, so their
//! existence does not leak across libraries.

use sqlx::PgConnection;
use uuid::Uuid;

use super::transaction::RowLock;
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
};

/// Library and role of the user performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub user_id: Uuid,
    pub role: Role,
    pub library_id: Uuid,
}

impl Scope {
    pub fn require(&self, role: Role) -> AppResult<()> {
        self.role.require(role)
    }

    /// Fails with `NotFound` when `library_id` is not the caller's library
    pub fn ensure_library(&self, library_id: Uuid) -> AppResult<()> {
        if self.library_id != library_id {
            return Err(AppError::NotFound(format!(
                "Library with id {} not found",
                library_id
            )));
        }
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, name, email, contact_number, role, library_id";

/// Read a user row by id under `lock`
pub async fn user_by_id(conn: &mut PgConnection, id: Uuid, lock: RowLock) -> AppResult<User> {
    let sql = format!("SELECT {} FROM users WHERE id = $1 {}", USER_COLUMNS, lock.clause());
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
}

/// Read a user row by email under `lock`
pub async fn user_by_email(conn: &mut PgConnection, email: &str, lock: RowLock) -> AppResult<User> {
    find_user_by_email(conn, email, lock)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found with given email".to_string()))
}

/// Locked existence check on an email, for inserts that must keep it unique
pub async fn find_user_by_email(
    conn: &mut PgConnection,
    email: &str,
    lock: RowLock,
) -> AppResult<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) {}",
        USER_COLUMNS,
        lock.clause()
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

/// Resolve the scope of `user_id`. Users without a library have no scope.
pub async fn resolve(conn: &mut PgConnection, user_id: Uuid, lock: RowLock) -> AppResult<Scope> {
    let user = user_by_id(conn, user_id, lock).await?;
    scope_of(&user)
}

pub fn scope_of(user: &User) -> AppResult<Scope> {
    let library_id = user.library_id.ok_or_else(|| {
        AppError::NotFound(format!("User {} is not attached to a library", user.id))
    })?;
    Ok(Scope {
        user_id: user.id,
        role: user.role,
        library_id,
    })
}
