//! Catalog endpoints shared by admins and readers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        book::{BookInventory, SearchField},
        issue::BookAvailability,
    },
    AppState,
};

use super::AuthenticatedUser;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring to look for; the whole inventory is listed when absent
    pub q: Option<String>,
    /// Field searched, `title` by default
    pub field: Option<SearchField>,
}

/// List or search the books of the caller's library
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books, by title", body = Vec<BookInventory>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Only library members browse the inventory")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<BookInventory>>> {
    let books = match query.q.as_deref() {
        Some(needle) if !needle.is_empty() => {
            let field = query.field.unwrap_or(SearchField::Title);
            state.services.inventory.search(&claims, field, needle).await?
        }
        _ => state.services.inventory.list(&claims).await?,
    };
    Ok(Json(books))
}

/// Get a book by ISBN
#[utoipa::path(
    get,
    path = "/books/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "Book ISBN")
    ),
    responses(
        (status = 200, description = "Book", body = BookInventory),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<BookInventory>> {
    let book = state.services.inventory.get_by_isbn(&claims, &isbn).await?;
    Ok(Json(book))
}

/// Available copies of a book and the next expected return
#[utoipa::path(
    get,
    path = "/books/{isbn}/availability",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "Book ISBN")
    ),
    responses(
        (status = 200, description = "Availability", body = BookAvailability),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<BookAvailability>> {
    let availability = state.services.circulation.availability(&claims, &isbn).await?;
    Ok(Json(availability))
}
