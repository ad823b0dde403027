//! Shared Postgres harness for integration tests.
//!
//! One container is started for the whole test binary and migrated once. Tests
//! isolate themselves by creating their own library, users and ISBNs.

#![allow(dead_code)]

use anyhow::{Context, Result};
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use libris_server::{
    models::{
        book::{BookDetails, BookInventory},
        library::Library,
        user::{NewUser, User},
    },
    repository::Repository,
};

struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // RUST_LOG=debug cargo test -- --ignored --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Fresh pool on the shared database
pub async fn pool() -> PgPool {
    let infra = SharedTestInfra::get().await;
    PgPool::connect(&infra.db_url)
        .await
        .expect("Failed to connect to test database")
}

pub fn new_user(tag: &str) -> NewUser {
    let suffix = Uuid::new_v4().simple().to_string();
    NewUser {
        name: format!("{} {}", tag, &suffix[..8]),
        email: format!("{}-{}@example.com", tag, suffix),
        contact: "0123456789".to_string(),
    }
}

/// A 13-digit ISBN no other test uses
pub fn unique_isbn() -> String {
    format!("{:013}", Uuid::new_v4().as_u128() % 10_000_000_000_000)
}

pub fn book(isbn: &str, title: &str) -> BookDetails {
    BookDetails {
        isbn: isbn.to_string(),
        title: title.to_string(),
        authors: "Frank Herbert".to_string(),
        publisher: "Chilton Books".to_string(),
        version: "1".to_string(),
    }
}

/// A library with its owner, one admin and one reader
pub struct LibraryFixture {
    pub repo: Repository,
    pub library: Library,
    pub owner: User,
    pub admin: User,
    pub reader: User,
}

impl LibraryFixture {
    pub async fn new() -> Self {
        Self::with_repository(Repository::new(pool().await)).await
    }

    pub async fn with_repository(repo: Repository) -> Self {
        let library_name = format!("Library {}", Uuid::new_v4());
        let (library, owner) = repo
            .libraries
            .create_library_with_owner(&library_name, new_user("owner"))
            .await
            .expect("create library");
        let admin = repo
            .libraries
            .onboard_admin(owner.id, library.id, new_user("admin"))
            .await
            .expect("onboard admin");
        let reader = repo
            .users
            .signup_reader(new_user("reader"), library.id)
            .await
            .expect("signup reader");

        Self {
            repo,
            library,
            owner,
            admin,
            reader,
        }
    }

    /// Add `copies` copies of a fresh ISBN through the admin
    pub async fn stock(&self, title: &str, copies: usize) -> BookInventory {
        let isbn = unique_isbn();
        let mut stocked = None;
        for _ in 0..copies {
            stocked = Some(
                self.repo
                    .books
                    .add_book(book(&isbn, title), &self.admin.email)
                    .await
                    .expect("add book"),
            );
        }
        stocked.expect("at least one copy")
    }

    pub async fn another_reader(&self) -> User {
        self.repo
            .users
            .signup_reader(new_user("reader"), self.library.id)
            .await
            .expect("signup reader")
    }
}
