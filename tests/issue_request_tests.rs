//! Issue request workflow against a real Postgres, including racing approvals.
//!
//! Run with: cargo test -- --ignored

mod common;

use chrono::Duration;
use common::{pool, LibraryFixture};
use libris_server::{
    models::issue::IssueStatus,
    repository::Repository,
    AppError,
};
use uuid::Uuid;

async fn open_loans(fx: &LibraryFixture, isbn: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM issue_registry WHERE isbn = $1 AND return_date IS NULL")
        .bind(isbn)
        .fetch_one(&fx.repo.pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_raise_approve_then_run_out() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 1).await;

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    assert!(request.approver_id.is_none());

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!(book.available_copies, 1);

    let pending = fx.repo.requests.list_pending(fx.admin.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request_id, request.request_id);
    assert_eq!(pending[0].book_title, "Dune");

    let issue = fx.repo.requests.approve(request.request_id, fx.admin.id).await.unwrap();
    assert_eq!(issue.issue_status, IssueStatus::Open);
    assert_eq!(issue.reader_id, fx.reader.id);
    assert_eq!(issue.issue_approver_id, fx.admin.id);
    assert_eq!(issue.expected_return_date - issue.issue_date, Duration::days(7));

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (1, 0));
    assert!(fx.repo.requests.list_pending(fx.admin.id).await.unwrap().is_empty());

    // Raising checks availability too
    let err = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_approval_rechecks_availability() {
    let fx = LibraryFixture::new().await;
    let second_reader = fx.another_reader().await;
    let stocked = fx.stock("Dune", 1).await;

    let first = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    let second = fx
        .repo
        .requests
        .raise(&stocked.isbn, &second_reader.email, second_reader.id)
        .await
        .unwrap();

    fx.repo.requests.approve(first.request_id, fx.admin.id).await.unwrap();

    let err = fx.repo.requests.approve(second.request_id, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The failed approval left everything as it was
    let pending = fx.repo.requests.list_pending(fx.admin.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request_id, second.request_id);
    assert_eq!(open_loans(&fx, &stocked.isbn).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_reject_then_approve_is_not_found() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 1).await;

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    fx.repo.requests.reject(request.request_id, fx.admin.id).await.unwrap();

    let err = fx.repo.requests.approve(request.request_id, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!(book.available_copies, 1);
}

#[tokio::test]
#[ignore]
async fn test_approved_request_is_terminal() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 2).await;

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    fx.repo.requests.approve(request.request_id, fx.admin.id).await.unwrap();

    let err = fx.repo.requests.approve(request.request_id, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = fx.repo.requests.reject(request.request_id, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!(book.available_copies, 1);
}

#[tokio::test]
#[ignore]
async fn test_unknown_request_is_not_found() {
    let fx = LibraryFixture::new().await;

    let err = fx.repo.requests.approve(Uuid::new_v4(), fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = fx.repo.requests.reject(Uuid::new_v4(), fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_readers_raise_only_for_themselves() {
    let fx = LibraryFixture::new().await;
    let other_reader = fx.another_reader().await;
    let stocked = fx.stock("Dune", 1).await;

    let err = fx
        .repo
        .requests
        .raise(&stocked.isbn, &other_reader.email, fx.reader.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let err = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.admin.email, fx.admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
#[ignore]
async fn test_requests_are_scoped_to_the_library() {
    let fx = LibraryFixture::new().await;
    let other = LibraryFixture::with_repository(fx.repo.clone()).await;
    let stocked = fx.stock("Dune", 1).await;

    // A reader of another library cannot see the book
    let err = fx
        .repo
        .requests
        .raise(&stocked.isbn, &other.reader.email, other.reader.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();

    assert!(other.repo.requests.list_pending(other.admin.id).await.unwrap().is_empty());

    let err = fx.repo.requests.approve(request.request_id, other.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = fx.repo.requests.reject(request.request_id, other.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(fx.repo.requests.list_pending(fx.admin.id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_availability_reports_next_return() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 2).await;

    let idle = fx.repo.requests.availability(&stocked.isbn, fx.reader.id).await.unwrap();
    assert_eq!(idle.available_copies, 2);
    assert!(idle.next_expected_return.is_none());

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    let issue = fx.repo.requests.approve(request.request_id, fx.admin.id).await.unwrap();

    let lent = fx.repo.requests.availability(&stocked.isbn, fx.reader.id).await.unwrap();
    assert_eq!(lent.available_copies, 1);
    let next = lent.next_expected_return.unwrap();
    // Postgres keeps microseconds
    assert!((next - issue.expected_return_date).num_milliseconds().abs() < 1);
}

async fn race_two_approvals(repo: Repository) {
    let fx = LibraryFixture::with_repository(repo).await;
    let second_reader = fx.another_reader().await;
    let stocked = fx.stock("Dune", 1).await;

    let first = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    let second = fx
        .repo
        .requests
        .raise(&stocked.isbn, &second_reader.email, second_reader.id)
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        fx.repo.requests.approve(first.request_id, fx.admin.id),
        fx.repo.requests.approve(second.request_id, fx.admin.id),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (1, 0));
    assert_eq!(open_loans(&fx, &stocked.isbn).await, 1);
    assert_eq!(fx.repo.requests.list_pending(fx.admin.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn test_concurrent_approvals_issue_one_copy() {
    race_two_approvals(Repository::new(pool().await)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn test_concurrent_approvals_with_serialized_transactions() {
    race_two_approvals(Repository::serialized(pool().await)).await;
}

async fn race_approval_and_removal(repo: Repository) {
    let fx = LibraryFixture::with_repository(repo).await;
    let stocked = fx.stock("Dune", 1).await;

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();

    let (approved, removed) = tokio::join!(
        fx.repo.requests.approve(request.request_id, fx.admin.id),
        fx.repo.books.remove_book(&stocked.isbn, fx.admin.id),
    );

    // Whichever runs first, the copy ends up on loan and the removal is refused
    assert!(approved.is_ok(), "approve failed: {:?}", approved.err());
    assert!(
        matches!(removed, Err(AppError::Conflict(_))),
        "unexpected removal outcome: {:?}",
        removed
    );

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (1, 0));
    assert_eq!(open_loans(&fx, &stocked.isbn).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn test_concurrent_approval_and_removal() {
    race_approval_and_removal(Repository::new(pool().await)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore]
async fn test_concurrent_approval_and_removal_with_serialized_transactions() {
    race_approval_and_removal(Repository::serialized(pool().await)).await;
}

#[tokio::test]
#[ignore]
async fn test_copy_counts_stay_within_bounds() {
    let fx = LibraryFixture::new().await;
    let readers = [fx.reader.clone(), fx.another_reader().await, fx.another_reader().await];
    let stocked = fx.stock("Dune", 2).await;

    let mut requests = Vec::new();
    for reader in &readers {
        requests.push(
            fx.repo
                .requests
                .raise(&stocked.isbn, &reader.email, reader.id)
                .await
                .unwrap(),
        );
    }
    for request in &requests {
        let _ = fx.repo.requests.approve(request.request_id, fx.admin.id).await;
    }
    let _ = fx.repo.books.remove_book(&stocked.isbn, fx.admin.id).await;
    fx.repo
        .books
        .add_book(common::book(&stocked.isbn, "Dune"), &fx.admin.email)
        .await
        .unwrap();
    let _ = fx.repo.books.remove_book(&stocked.isbn, fx.admin.id).await;

    let out_of_bounds: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM book_inventory
        WHERE available_copies < 0 OR available_copies > total_copies
        "#,
    )
    .fetch_one(&fx.repo.pool)
    .await
    .unwrap();
    assert_eq!(out_of_bounds, 0);

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!(book.total_copies - book.available_copies, open_loans(&fx, &stocked.isbn).await as i32);
}
