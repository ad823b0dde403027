//! Book inventory model and copy accounting
//!
//! A `BookInventory` row holds every copy of one ISBN in one library. The counters
//! always satisfy `0 <= available_copies <= total_copies`; the rules below are the
//! only place they are computed, the repository applies the result under a row lock.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInventory {
    pub isbn: String,
    pub library_id: Uuid,
    pub title: String,
    pub authors: String,
    pub publisher: String,
    pub version: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// What removing one copy does to the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRemoval {
    /// Last copy, nothing on loan: the row goes away
    DeleteRow,
    /// One shelved copy leaves; both counters become these values
    Decrement { total_copies: i32, available_copies: i32 },
}

impl BookInventory {
    /// Counters after one more copy of an existing ISBN is added.
    ///
    /// Cross-library reuse of an ISBN is rejected: ISBNs are global keys.
    pub fn restock(&self, library_id: Uuid) -> AppResult<(i32, i32)> {
        if self.library_id != library_id {
            return Err(AppError::Conflict(format!(
                "Book with ISBN {} is already registered in another library",
                self.isbn
            )));
        }
        Ok((self.total_copies + 1, self.available_copies + 1))
    }

    pub fn plan_removal(&self) -> AppResult<CopyRemoval> {
        if self.available_copies == 1 && self.total_copies == 1 {
            return Ok(CopyRemoval::DeleteRow);
        }
        if self.available_copies > 0 {
            return Ok(CopyRemoval::Decrement {
                total_copies: self.total_copies - 1,
                available_copies: self.available_copies - 1,
            });
        }
        Err(AppError::Conflict("Cannot remove issued books".to_string()))
    }

    /// Fails with `Conflict` when no copy is on the shelf
    pub fn ensure_available(&self) -> AppResult<()> {
        if self.available_copies < 1 {
            return Err(AppError::Conflict("No available copies to issue".to_string()));
        }
        Ok(())
    }

    /// Available count after one copy is lent out
    pub fn after_issue(&self) -> AppResult<i32> {
        self.ensure_available()?;
        Ok(self.available_copies - 1)
    }
}

/// Descriptive fields of a book, as supplied by an admin
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookDetails {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Authors are required"))]
    pub authors: String,
    #[validate(length(min = 1, message = "Publisher is required"))]
    pub publisher: String,
    #[validate(length(min = 1, message = "Version is required"))]
    pub version: String,
}

/// Column a substring search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Authors,
    Publisher,
}

impl SearchField {
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Authors => "authors",
            SearchField::Publisher => "publisher",
        }
    }
}

/// Build a `LIKE ... ESCAPE '\'` pattern matching `needle` anywhere, literally
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
