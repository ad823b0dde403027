//! Inventory ledger and catalog search against a real Postgres.
//!
//! Run with: cargo test -- --ignored

mod common;

use common::{book, unique_isbn, LibraryFixture};
use libris_server::{models::book::SearchField, AppError};

#[tokio::test]
#[ignore]
async fn test_add_book_then_restock() {
    let fx = LibraryFixture::new().await;
    let isbn = unique_isbn();

    let first = fx.repo.books.add_book(book(&isbn, "Dune"), &fx.admin.email).await.unwrap();
    assert_eq!((first.total_copies, first.available_copies), (1, 1));
    assert_eq!(first.library_id, fx.library.id);

    let second = fx.repo.books.add_book(book(&isbn, "Dune"), &fx.admin.email).await.unwrap();
    assert_eq!((second.total_copies, second.available_copies), (2, 2));
}

#[tokio::test]
#[ignore]
async fn test_isbn_cannot_move_across_libraries() {
    let fx = LibraryFixture::new().await;
    let other = LibraryFixture::with_repository(fx.repo.clone()).await;
    let stocked = fx.stock("Dune", 1).await;

    let err = other
        .repo
        .books
        .add_book(book(&stocked.isbn, "Dune"), &other.admin.email)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let unchanged = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!(unchanged.total_copies, 1);
}

#[tokio::test]
#[ignore]
async fn test_only_admins_add_books() {
    let fx = LibraryFixture::new().await;

    let err = fx
        .repo
        .books
        .add_book(book(&unique_isbn(), "Dune"), &fx.reader.email)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let err = fx
        .repo
        .books
        .add_book(book(&unique_isbn(), "Dune"), "nobody@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_removing_last_copy_deletes_the_row() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 1).await;

    let remaining = fx.repo.books.remove_book(&stocked.isbn, fx.admin.id).await.unwrap();
    assert!(remaining.is_none());

    let err = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_last_copy_with_pending_request_is_kept() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 1).await;

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();

    let err = fx.repo.books.remove_book(&stocked.isbn, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (1, 1));
    let pending = fx.repo.requests.list_pending(fx.admin.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request_id, request.request_id);

    // Once the request is rejected the last copy can go
    fx.repo.requests.reject(request.request_id, fx.admin.id).await.unwrap();
    let remaining = fx.repo.books.remove_book(&stocked.isbn, fx.admin.id).await.unwrap();
    assert!(remaining.is_none());
}

#[tokio::test]
#[ignore]
async fn test_remove_with_spare_copies_keeps_pending_requests() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 2).await;

    fx.repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();

    let remaining = fx
        .repo
        .books
        .remove_book(&stocked.isbn, fx.admin.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((remaining.total_copies, remaining.available_copies), (1, 1));
    assert_eq!(fx.repo.requests.list_pending(fx.admin.id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_remove_decrements_both_counts() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 3).await;

    let remaining = fx
        .repo
        .books
        .remove_book(&stocked.isbn, fx.admin.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((remaining.total_copies, remaining.available_copies), (2, 2));
}

#[tokio::test]
#[ignore]
async fn test_cannot_remove_issued_books() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 1).await;

    let request = fx
        .repo
        .requests
        .raise(&stocked.isbn, &fx.reader.email, fx.reader.id)
        .await
        .unwrap();
    fx.repo.requests.approve(request.request_id, fx.admin.id).await.unwrap();

    let err = fx.repo.books.remove_book(&stocked.isbn, fx.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let book = fx.repo.books.get_by_isbn(&stocked.isbn, fx.admin.id).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (1, 0));
}

#[tokio::test]
#[ignore]
async fn test_update_keeps_copy_counts() {
    let fx = LibraryFixture::new().await;
    let stocked = fx.stock("Dune", 2).await;

    let mut details = book(&stocked.isbn, "Dune Messiah");
    details.authors = "F. Herbert".to_string();
    details.publisher = "Putnam".to_string();
    details.version = "2".to_string();

    let updated = fx.repo.books.update_book(details, fx.admin.id).await.unwrap();
    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.authors, "F. Herbert");
    assert_eq!(updated.publisher, "Putnam");
    assert_eq!(updated.version, "2");
    assert_eq!((updated.total_copies, updated.available_copies), (2, 2));
}

#[tokio::test]
#[ignore]
async fn test_other_library_books_are_not_found() {
    let fx = LibraryFixture::new().await;
    let other = LibraryFixture::with_repository(fx.repo.clone()).await;
    let stocked = fx.stock("Dune", 1).await;

    let err = fx.repo.books.get_by_isbn(&stocked.isbn, other.reader.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = fx.repo.books.remove_book(&stocked.isbn, other.admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = fx
        .repo
        .books
        .update_book(book(&stocked.isbn, "Stolen"), other.admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_search_is_case_insensitive_and_scoped() {
    let fx = LibraryFixture::new().await;
    let other = LibraryFixture::with_repository(fx.repo.clone()).await;
    let dune = fx.stock("Dune", 1).await;
    fx.stock("Neuromancer", 1).await;
    other.stock("Dune", 1).await;

    let found = fx.repo.books.search(SearchField::Title, "dUN", fx.reader.id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].isbn, dune.isbn);

    let by_author = fx
        .repo
        .books
        .search(SearchField::Authors, "herbert", fx.reader.id)
        .await
        .unwrap();
    assert_eq!(by_author.len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_search_wildcards_are_literal() {
    let fx = LibraryFixture::new().await;
    fx.stock("Dune", 1).await;
    let percent = fx.stock("100% Rust", 1).await;

    let found = fx.repo.books.search(SearchField::Title, "%", fx.reader.id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].isbn, percent.isbn);

    let found = fx.repo.books.search(SearchField::Title, "D_ne", fx.reader.id).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_list_is_ordered_by_title() {
    let fx = LibraryFixture::new().await;
    fx.stock("Neuromancer", 1).await;
    fx.stock("Dune", 1).await;
    fx.stock("Hyperion", 1).await;

    let titles: Vec<String> = fx
        .repo
        .books
        .list(fx.admin.id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, ["Dune", "Hyperion", "Neuromancer"]);
}
