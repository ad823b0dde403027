//! Users repository: login lookup, reader signup, profile

use uuid::Uuid;

use super::{
    libraries::{insert_user, lock_library},
    scope,
    transaction::{RowLock, TxManager},
};
use crate::{
    error::AppResult,
    models::user::{NewUser, Role, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    tx: TxManager,
}

impl UsersRepository {
    pub fn new(tx: TxManager) -> Self {
        Self { tx }
    }

    /// Passwordless login lookup
    pub async fn login(&self, email: &str) -> AppResult<User> {
        let email = email.to_string();

        self.tx
            .execute(move |conn| Box::pin(async move { scope::user_by_email(conn, &email, RowLock::Share).await }))
            .await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.tx
            .execute(move |conn| Box::pin(async move { scope::user_by_id(conn, id, RowLock::Share).await }))
            .await
    }

    /// Sign up a reader into an existing library
    pub async fn signup_reader(&self, reader: NewUser, library_id: Uuid) -> AppResult<User> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    lock_library(conn, library_id).await?;
                    insert_user(conn, &reader, Role::Reader, Some(library_id)).await
                })
            })
            .await
    }
}
