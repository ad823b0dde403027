//! Book inventory repository: the copy ledger and scoped search

use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    scope,
    transaction::{RowLock, TxManager},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{contains_pattern, BookDetails, BookInventory, CopyRemoval, SearchField},
        user::Role,
    },
};

const BOOK_COLUMNS: &str =
    "isbn, library_id, title, authors, publisher, version, total_copies, available_copies";

/// Read a book row under `lock`, optionally restricted to one library
pub(super) async fn find_book(
    conn: &mut PgConnection,
    isbn: &str,
    library_id: Option<Uuid>,
    lock: RowLock,
) -> AppResult<Option<BookInventory>> {
    let book = match library_id {
        Some(library_id) => {
            let sql = format!(
                "SELECT {} FROM book_inventory WHERE isbn = $1 AND library_id = $2 {}",
                BOOK_COLUMNS,
                lock.clause()
            );
            sqlx::query_as::<_, BookInventory>(&sql)
                .bind(isbn)
                .bind(library_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM book_inventory WHERE isbn = $1 {}",
                BOOK_COLUMNS,
                lock.clause()
            );
            sqlx::query_as::<_, BookInventory>(&sql)
                .bind(isbn)
                .fetch_optional(&mut *conn)
                .await?
        }
    };
    Ok(book)
}

/// Lock a book of `library_id` for writing; `NotFound` if absent or out of scope
pub(super) async fn lock_book(
    conn: &mut PgConnection,
    isbn: &str,
    library_id: Uuid,
) -> AppResult<BookInventory> {
    find_book(conn, isbn, Some(library_id), RowLock::Update)
        .await?
        .ok_or_else(|| book_not_found(isbn))
}

pub(super) async fn set_available_copies(
    conn: &mut PgConnection,
    isbn: &str,
    available_copies: i32,
) -> AppResult<()> {
    sqlx::query("UPDATE book_inventory SET available_copies = $1 WHERE isbn = $2")
        .bind(available_copies)
        .bind(isbn)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn set_copies(
    conn: &mut PgConnection,
    isbn: &str,
    total_copies: i32,
    available_copies: i32,
) -> AppResult<BookInventory> {
    let sql = format!(
        "UPDATE book_inventory SET total_copies = $1, available_copies = $2 WHERE isbn = $3 RETURNING {}",
        BOOK_COLUMNS
    );
    let book = sqlx::query_as::<_, BookInventory>(&sql)
        .bind(total_copies)
        .bind(available_copies)
        .bind(isbn)
        .fetch_one(&mut *conn)
        .await?;
    Ok(book)
}

pub(super) fn book_not_found(isbn: &str) -> AppError {
    AppError::NotFound(format!("Book with ISBN {} not found", isbn))
}

#[derive(Clone)]
pub struct BooksRepository {
    tx: TxManager,
}

impl BooksRepository {
    pub fn new(tx: TxManager) -> Self {
        Self { tx }
    }

    /// Add one copy of a book to the acting admin's library.
    ///
    /// An ISBN already present in that library is restocked; a new ISBN starts with
    /// one copy.
    pub async fn add_book(&self, book: BookDetails, admin_email: &str) -> AppResult<BookInventory> {
        let admin_email = admin_email.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let admin = scope::user_by_email(conn, &admin_email, RowLock::Share).await?;
                    admin.role.require(Role::Admin)?;
                    let scope = scope::scope_of(&admin)?;

                    if let Some(existing) = find_book(conn, &book.isbn, None, RowLock::Update).await? {
                        let (total_copies, available_copies) = existing.restock(scope.library_id)?;
                        return set_copies(conn, &existing.isbn, total_copies, available_copies).await;
                    }

                    // A concurrent add of the same new ISBN makes this a no-op; the row
                    // it committed is then restocked below.
                    let sql = format!(
                        r#"
                        INSERT INTO book_inventory ({})
                        VALUES ($1, $2, $3, $4, $5, $6, 1, 1)
                        ON CONFLICT (isbn) DO NOTHING
                        RETURNING {}
                        "#,
                        BOOK_COLUMNS, BOOK_COLUMNS
                    );
                    let inserted = sqlx::query_as::<_, BookInventory>(&sql)
                        .bind(&book.isbn)
                        .bind(scope.library_id)
                        .bind(&book.title)
                        .bind(&book.authors)
                        .bind(&book.publisher)
                        .bind(&book.version)
                        .fetch_optional(&mut *conn)
                        .await?;
                    if let Some(inserted) = inserted {
                        return Ok(inserted);
                    }

                    let existing = find_book(conn, &book.isbn, None, RowLock::Update)
                        .await?
                        .ok_or_else(|| book_not_found(&book.isbn))?;
                    let (total_copies, available_copies) = existing.restock(scope.library_id)?;
                    set_copies(conn, &existing.isbn, total_copies, available_copies).await
                })
            })
            .await
    }

    /// Remove one shelved copy. Returns the remaining row, or `None` once the last
    /// copy is gone and the row was deleted.
    ///
    /// The last copy of a book with pending requests is kept: the caller gets
    /// `Conflict` and must reject those requests first.
    pub async fn remove_book(&self, isbn: &str, user_id: Uuid) -> AppResult<Option<BookInventory>> {
        let isbn = isbn.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, user_id, RowLock::Share).await?;
                    scope.require(Role::Admin)?;

                    let book = lock_book(conn, &isbn, scope.library_id).await?;
                    match book.plan_removal()? {
                        CopyRemoval::DeleteRow => {
                            // Raise takes the book lock before inserting, so no new
                            // request can appear while it is held.
                            let referenced: bool = sqlx::query_scalar(
                                r#"
                                SELECT EXISTS (SELECT 1 FROM request_events WHERE book_id = $1)
                                    OR EXISTS (SELECT 1 FROM issue_registry WHERE isbn = $1)
                                "#,
                            )
                            .bind(&book.isbn)
                            .fetch_one(&mut *conn)
                            .await?;
                            if referenced {
                                return Err(AppError::Conflict(
                                    "Cannot remove a book with pending issue requests".to_string(),
                                ));
                            }

                            sqlx::query("DELETE FROM book_inventory WHERE isbn = $1")
                                .bind(&book.isbn)
                                .execute(&mut *conn)
                                .await?;
                            Ok(None)
                        }
                        CopyRemoval::Decrement {
                            total_copies,
                            available_copies,
                        } => {
                            let book = set_copies(conn, &book.isbn, total_copies, available_copies).await?;
                            Ok(Some(book))
                        }
                    }
                })
            })
            .await
    }

    /// Overwrite the descriptive fields of a book. Copy counts are untouched.
    pub async fn update_book(&self, book: BookDetails, user_id: Uuid) -> AppResult<BookInventory> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, user_id, RowLock::Share).await?;
                    scope.require(Role::Admin)?;

                    let existing = lock_book(conn, &book.isbn, scope.library_id).await?;

                    let sql = format!(
                        r#"
                        UPDATE book_inventory
                        SET title = $1, authors = $2, publisher = $3, version = $4
                        WHERE isbn = $5
                        RETURNING {}
                        "#,
                        BOOK_COLUMNS
                    );
                    let updated = sqlx::query_as::<_, BookInventory>(&sql)
                        .bind(&book.title)
                        .bind(&book.authors)
                        .bind(&book.publisher)
                        .bind(&book.version)
                        .bind(&existing.isbn)
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok(updated)
                })
            })
            .await
    }

    /// Case-insensitive substring search in the caller's library
    pub async fn search(
        &self,
        field: SearchField,
        needle: &str,
        user_id: Uuid,
    ) -> AppResult<Vec<BookInventory>> {
        let pattern = contains_pattern(needle);

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, user_id, RowLock::Share).await?;

                    let sql = format!(
                        r#"
                        SELECT {} FROM book_inventory
                        WHERE library_id = $1 AND LOWER({}) LIKE LOWER($2) ESCAPE '\'
                        ORDER BY title, isbn
                        "#,
                        BOOK_COLUMNS,
                        field.column()
                    );
                    let books = sqlx::query_as::<_, BookInventory>(&sql)
                        .bind(scope.library_id)
                        .bind(&pattern)
                        .fetch_all(&mut *conn)
                        .await?;
                    Ok(books)
                })
            })
            .await
    }

    /// Point lookup in the caller's library
    pub async fn get_by_isbn(&self, isbn: &str, user_id: Uuid) -> AppResult<BookInventory> {
        let isbn = isbn.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, user_id, RowLock::Share).await?;
                    find_book(conn, &isbn, Some(scope.library_id), RowLock::Share)
                        .await?
                        .ok_or_else(|| book_not_found(&isbn))
                })
            })
            .await
    }

    /// Whole inventory of the caller's library
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<BookInventory>> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, user_id, RowLock::Share).await?;

                    let sql = format!(
                        "SELECT {} FROM book_inventory WHERE library_id = $1 ORDER BY title, isbn",
                        BOOK_COLUMNS
                    );
                    let books = sqlx::query_as::<_, BookInventory>(&sql)
                        .bind(scope.library_id)
                        .fetch_all(&mut *conn)
                        .await?;
                    Ok(books)
                })
            })
            .await
    }
}
