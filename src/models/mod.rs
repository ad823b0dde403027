//! Data models for Libris

pub mod book;
pub mod issue;
pub mod library;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use book::{BookInventory, SearchField};
pub use issue::{BookAvailability, IssueRegistry};
pub use library::{Library, LibraryDetails};
pub use request::{IssueRequestDetails, RequestEvent};
pub use user::{Role, User, UserClaims};
