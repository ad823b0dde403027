//! Repository layer: the transactional core
//!
//! Every public operation opens exactly one transaction through [`TxManager`].

pub mod books;
pub mod libraries;
pub mod requests;
pub mod scope;
pub mod transaction;
pub mod users;

use sqlx::{Pool, Postgres};

pub use transaction::{RowLock, TxManager};

/// Main repository struct holding the transaction manager
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub requests: requests::RequestsRepository,
    pub libraries: libraries::LibrariesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::with_tx(TxManager::new(pool))
    }

    /// Like [`Repository::new`], with every transaction run one at a time
    pub fn serialized(pool: Pool<Postgres>) -> Self {
        Self::with_tx(TxManager::new(pool).serialized())
    }

    fn with_tx(tx: TxManager) -> Self {
        Self {
            pool: tx.pool().clone(),
            books: books::BooksRepository::new(tx.clone()),
            requests: requests::RequestsRepository::new(tx.clone()),
            libraries: libraries::LibrariesRepository::new(tx.clone()),
            users: users::UsersRepository::new(tx),
        }
    }
}
