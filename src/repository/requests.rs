//! Issue request workflow
//!
//! `PENDING -> APPROVED | REJECTED`. Raising a request only checks availability
//! loosely; approval re-checks it under the book's row lock, decrements the shelf
//! count, stamps the request and opens the loan in the same transaction.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    books::{book_not_found, find_book, lock_book, set_available_copies},
    scope,
    transaction::{RowLock, TxManager},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookInventory,
        issue::{BookAvailability, IssueRegistry},
        request::{IssueRequestDetails, RequestEvent},
        user::Role,
    },
};

const REQUEST_COLUMNS: &str =
    "request_id, book_id, reader_id, request_date, approval_date, approver_id, request_type";

async fn lock_request(conn: &mut PgConnection, request_id: Uuid) -> AppResult<RequestEvent> {
    let sql = format!(
        "SELECT {} FROM request_events WHERE request_id = $1 FOR UPDATE",
        REQUEST_COLUMNS
    );
    sqlx::query_as::<_, RequestEvent>(&sql)
        .bind(request_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid issue request ID".to_string()))
}

/// Lock the book a request points at, within the acting admin's library.
/// A request for another library's book is reported like a missing request.
async fn lock_requested_book(
    conn: &mut PgConnection,
    request: &RequestEvent,
    library_id: Uuid,
) -> AppResult<BookInventory> {
    lock_book(conn, &request.book_id, library_id)
        .await
        .map_err(|err| match err {
            AppError::NotFound(_) => AppError::NotFound("Invalid issue request ID".to_string()),
            other => other,
        })
}

#[derive(Clone)]
pub struct RequestsRepository {
    tx: TxManager,
}

impl RequestsRepository {
    pub fn new(tx: TxManager) -> Self {
        Self { tx }
    }

    /// Record a reader's request to borrow a book of their library.
    ///
    /// Availability is not decremented here; approval is where copies are taken.
    pub async fn raise(&self, isbn: &str, reader_email: &str, reader_id: Uuid) -> AppResult<RequestEvent> {
        let isbn = isbn.to_string();
        let reader_email = reader_email.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let reader = scope::user_by_email(conn, &reader_email, RowLock::Share).await?;
                    reader.role.require(Role::Reader)?;
                    if reader.id != reader_id {
                        return Err(AppError::Authorization(
                            "Access denied. Requests can only be raised for yourself".to_string(),
                        ));
                    }
                    let scope = scope::scope_of(&reader)?;

                    let book = lock_book(conn, &isbn, scope.library_id).await?;
                    book.ensure_available()?;

                    let request = RequestEvent::pending(book.isbn, reader.id, Utc::now());
                    sqlx::query(
                        r#"
                        INSERT INTO request_events (request_id, book_id, reader_id, request_date, request_type)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(request.request_id)
                    .bind(&request.book_id)
                    .bind(request.reader_id)
                    .bind(request.request_date)
                    .bind(request.request_type.as_str())
                    .execute(&mut *conn)
                    .await?;

                    Ok(request)
                })
            })
            .await
    }

    /// Pending requests for books of the admin's library, oldest first
    pub async fn list_pending(&self, admin_id: Uuid) -> AppResult<Vec<IssueRequestDetails>> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, admin_id, RowLock::Share).await?;
                    scope.require(Role::Admin)?;

                    let requests = sqlx::query_as::<_, IssueRequestDetails>(
                        r#"
                        SELECT r.request_id, r.book_id AS isbn, r.reader_id, r.request_date,
                               b.title AS book_title, b.available_copies
                        FROM request_events r
                        JOIN book_inventory b ON b.isbn = r.book_id
                        WHERE r.approver_id IS NULL AND b.library_id = $1
                        ORDER BY r.request_date, r.request_id
                        "#,
                    )
                    .bind(scope.library_id)
                    .fetch_all(&mut *conn)
                    .await?;
                    Ok(requests)
                })
            })
            .await
    }

    /// Approve a pending request: take one copy off the shelf, stamp the request and
    /// open a loan. Fails with `Conflict` if no copy is available at lock time.
    pub async fn approve(&self, request_id: Uuid, approver_id: Uuid) -> AppResult<IssueRegistry> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, approver_id, RowLock::Share).await?;
                    scope.require(Role::Admin)?;

                    let request = lock_request(conn, request_id).await?;
                    let book = lock_requested_book(conn, &request, scope.library_id).await?;
                    request.ensure_pending()?;
                    let available_copies = book.after_issue()?;

                    let now = Utc::now();
                    set_available_copies(conn, &book.isbn, available_copies).await?;

                    sqlx::query(
                        "UPDATE request_events SET approver_id = $1, approval_date = $2 WHERE request_id = $3",
                    )
                    .bind(scope.user_id)
                    .bind(now)
                    .bind(request.request_id)
                    .execute(&mut *conn)
                    .await?;

                    let issue = IssueRegistry::open(book.isbn, request.reader_id, scope.user_id, now);
                    sqlx::query(
                        r#"
                        INSERT INTO issue_registry (
                            issue_id, isbn, reader_id, issue_approver_id, issue_status,
                            issue_date, expected_return_date
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        "#,
                    )
                    .bind(issue.issue_id)
                    .bind(&issue.isbn)
                    .bind(issue.reader_id)
                    .bind(issue.issue_approver_id)
                    .bind(issue.issue_status.as_str())
                    .bind(issue.issue_date)
                    .bind(issue.expected_return_date)
                    .execute(&mut *conn)
                    .await?;

                    Ok(issue)
                })
            })
            .await
    }

    /// Reject a pending request. The row is deleted; inventory is untouched.
    pub async fn reject(&self, request_id: Uuid, admin_id: Uuid) -> AppResult<()> {
        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, admin_id, RowLock::Share).await?;
                    scope.require(Role::Admin)?;

                    let request = lock_request(conn, request_id).await?;
                    let in_scope = find_book(conn, &request.book_id, Some(scope.library_id), RowLock::Share)
                        .await?
                        .is_some();
                    if !in_scope {
                        return Err(AppError::NotFound("Invalid issue request ID".to_string()));
                    }
                    request.ensure_pending()?;

                    sqlx::query("DELETE FROM request_events WHERE request_id = $1")
                        .bind(request.request_id)
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .await
    }

    /// Shelf count of a book and the earliest due date among its open loans
    pub async fn availability(&self, isbn: &str, user_id: Uuid) -> AppResult<BookAvailability> {
        let isbn = isbn.to_string();

        self.tx
            .execute(move |conn| {
                Box::pin(async move {
                    let scope = scope::resolve(conn, user_id, RowLock::Share).await?;
                    let book = find_book(conn, &isbn, Some(scope.library_id), RowLock::Share)
                        .await?
                        .ok_or_else(|| book_not_found(&isbn))?;

                    let next_expected_return: Option<DateTime<Utc>> = sqlx::query_scalar(
                        "SELECT MIN(expected_return_date) FROM issue_registry WHERE isbn = $1 AND return_date IS NULL",
                    )
                    .bind(&book.isbn)
                    .fetch_one(&mut *conn)
                    .await?;

                    Ok(BookAvailability {
                        isbn: book.isbn,
                        available_copies: book.available_copies,
                        next_expected_return,
                    })
                })
            })
            .await
    }
}
