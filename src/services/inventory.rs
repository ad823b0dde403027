//! Inventory service: the book ledger and catalog search

use super::trace_refusal;
use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, BookInventory, SearchField},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add one copy of a book to the admin's library
    pub async fn add_book(&self, claims: &UserClaims, book: BookDetails) -> AppResult<BookInventory> {
        trace_refusal("add book", claims, claims.require_admin())?;

        let result = self.repository.books.add_book(book, &claims.sub).await;
        let book = trace_refusal("add book", claims, result)?;
        tracing::info!(
            isbn = %book.isbn,
            total_copies = book.total_copies,
            available_copies = book.available_copies,
            "Book copy added"
        );
        Ok(book)
    }

    /// Remove one copy. `None` when the last copy was removed.
    pub async fn remove_book(&self, claims: &UserClaims, isbn: &str) -> AppResult<Option<BookInventory>> {
        trace_refusal("remove book", claims, claims.require_admin())?;

        let result = self.repository.books.remove_book(isbn, claims.user_id).await;
        let remaining = trace_refusal("remove book", claims, result)?;
        match &remaining {
            Some(book) => tracing::info!(isbn = %isbn, total_copies = book.total_copies, "Book copy removed"),
            None => tracing::info!(isbn = %isbn, "Last book copy removed"),
        }
        Ok(remaining)
    }

    pub async fn update_book(&self, claims: &UserClaims, book: BookDetails) -> AppResult<BookInventory> {
        trace_refusal("update book", claims, claims.require_admin())?;

        let result = self.repository.books.update_book(book, claims.user_id).await;
        let book = trace_refusal("update book", claims, result)?;
        tracing::info!(isbn = %book.isbn, "Book details updated");
        Ok(book)
    }

    pub async fn search(
        &self,
        claims: &UserClaims,
        field: SearchField,
        needle: &str,
    ) -> AppResult<Vec<BookInventory>> {
        trace_refusal("search books", claims, claims.require_library_member())?;
        self.repository.books.search(field, needle, claims.user_id).await
    }

    pub async fn get_by_isbn(&self, claims: &UserClaims, isbn: &str) -> AppResult<BookInventory> {
        trace_refusal("get book", claims, claims.require_library_member())?;
        let result = self.repository.books.get_by_isbn(isbn, claims.user_id).await;
        trace_refusal("get book", claims, result)
    }

    pub async fn list(&self, claims: &UserClaims) -> AppResult<Vec<BookInventory>> {
        trace_refusal("list books", claims, claims.require_library_member())?;
        self.repository.books.list(claims.user_id).await
    }
}
