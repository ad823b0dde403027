//! Owner operations: libraries and admin onboarding
//!
//! Uniqueness of library names and emails is checked with a locked read in the same
//! transaction as the insert. The unique constraints stay authoritative: a violation
//! raised by the insert itself is reported as `Conflict` too.

use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    scope,
    transaction::{RowLock, TxManager},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        library::{Library, LibraryDetails},
        user::{NewUser, Role, User},
    },
};

async fn ensure_email_free(conn: &mut PgConnection, email: &str) -> AppResult<()> {
    if scope::find_user_by_email(conn, email, RowLock::Update).await?.is_some() {
        return Err(AppError::Conflict("User with this email already exists".to_string()));
    }
    Ok(())
}

async fn ensure_library_name_free(conn: &mut PgConnection, name: &str) -> AppResult<()> {
    let taken: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM libraries WHERE LOWER(name) = LOWER($1) FOR UPDATE")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Library with this name already exists".to_string()));
    }
    Ok(())
}

/// Insert a user row. Shared with reader signup.
pub(super) async fn insert_user(
    conn: &mut PgConnection,
    user: &NewUser,
    role: Role,
    library_id: Option<Uuid>,
) -> AppResult<User> {
    ensure_email_free(conn, &user.email).await?;

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, contact_number, role, library_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, email, contact_number, role, library_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.contact)
    .bind(role)
    .bind(library_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, "User with this email already exists"))
}

async fn insert_library(conn: &mut PgConnection, name: &str) -> AppResult<Library> {
    ensure_library_name_free(conn, name).await?;

    sqlx::query_as::<_, Library>("INSERT INTO libraries (id, name) VALUES ($1, $2) RETURNING id, name")
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Library with this name already exists"))
}

/// Attach a library-less owner to `library`
async fn attach_owner(conn: &mut PgConnection, owner: &User, library: &Library) -> AppResult<User> {
    if owner.library_id.is_some() {
        return Err(AppError::Conflict("Owner already has a library".to_string()));
    }
    let owner = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET library_id = $1 WHERE id = $2
        RETURNING id, name, email, contact_number, role, library_id
        "#,
    )
    .bind(library.id)
    .bind(owner.id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(owner)
}

#[derive(Clone)]
pub struct LibrariesRepository {
    tx: TxManager,
}

impl LibrariesRepository {
    pub fn new(tx: TxManager) -> Self {
        Self { tx }
    }

    /// Sign up an owner without a library
    pub async fn create_owner(&self, owner: NewUser) -> AppResult<User> {
        self.tx
            .execute(move |conn| Box::pin(async move { insert_user(conn, &owner, Role::Owner, None).await }))
            .await
    }

    /// Create the library of an existing owner. An owner has at most one library.
    pub async fn create_library(&self, owner_id: Uuid, library_name: &str) -> AppResult<Library> {
        let library_name = library_name.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let owner = scope::user_by_id(conn, owner_id, RowLock::Update).await?;
                    owner.role.require(Role::Owner)?;
                    if owner.library_id.is_some() {
                        return Err(AppError::Conflict("Owner already has a library".to_string()));
                    }

                    let library = insert_library(conn, &library_name).await?;
                    attach_owner(conn, &owner, &library).await?;
                    Ok(library)
                })
            })
            .await
    }

    /// Owner signup and library creation as one unit
    pub async fn create_library_with_owner(
        &self,
        library_name: &str,
        owner: NewUser,
    ) -> AppResult<(Library, User)> {
        let library_name = library_name.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let library = insert_library(conn, &library_name).await?;
                    let owner = insert_user(conn, &owner, Role::Owner, None).await?;
                    let owner = attach_owner(conn, &owner, &library).await?;
                    Ok((library, owner))
                })
            })
            .await
    }

    /// Create an admin in the owner's library
    pub async fn onboard_admin(&self, owner_id: Uuid, library_id: Uuid, admin: NewUser) -> AppResult<User> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, owner_id, RowLock::Share).await?;
                    scope.require(Role::Owner)?;
                    scope.ensure_library(library_id)?;

                    lock_library(conn, library_id).await?;
                    insert_user(conn, &admin, Role::Admin, Some(library_id)).await
                })
            })
            .await
    }

    /// Libraries of an owner with their counts. Empty until the owner creates one.
    pub async fn get_libraries(&self, owner_id: Uuid) -> AppResult<Vec<LibraryDetails>> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let owner = scope::user_by_id(conn, owner_id, RowLock::Share).await?;
                    owner.role.require(Role::Owner)?;

                    let libraries = sqlx::query_as::<_, LibraryDetails>(
                        r#"
                        SELECT l.id, l.name,
                            (SELECT COUNT(*) FROM users u WHERE u.library_id = l.id AND u.role = 'admin') AS admin_count,
                            (SELECT COUNT(*) FROM users u WHERE u.library_id = l.id AND u.role = 'reader') AS reader_count,
                            (SELECT COUNT(*) FROM book_inventory b WHERE b.library_id = l.id) AS title_count,
                            (SELECT COALESCE(SUM(b.total_copies), 0)::BIGINT FROM book_inventory b WHERE b.library_id = l.id) AS total_copies
                        FROM libraries l
                        WHERE l.id = $1
                        ORDER BY l.name
                        "#,
                    )
                    .bind(owner.library_id)
                    .fetch_all(&mut *conn)
                    .await?;
                    Ok(libraries)
                })
            })
            .await
    }

    /// Admins of one of the owner's libraries
    pub async fn get_admins(&self, owner_id: Uuid, library_id: Uuid) -> AppResult<Vec<User>> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, owner_id, RowLock::Share).await?;
                    scope.require(Role::Owner)?;
                    scope.ensure_library(library_id)?;

                    let admins = sqlx::query_as::<_, User>(
                        r#"
                        SELECT id, name, email, contact_number, role, library_id
                        FROM users
                        WHERE library_id = $1 AND role = 'admin'
                        ORDER BY name, email
                        "#,
                    )
                    .bind(library_id)
                    .fetch_all(&mut *conn)
                    .await?;
                    Ok(admins)
                })
            })
            .await
    }
}

/// Share-lock a library row so it cannot be deleted under a new member
pub(super) async fn lock_library(conn: &mut PgConnection, library_id: Uuid) -> AppResult<Library> {
    sqlx::query_as::<_, Library>("SELECT id, name FROM libraries WHERE id = $1 FOR SHARE")
        .bind(library_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", library_id)))
}
