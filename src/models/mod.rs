//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod pagination;
pub mod renewal;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails, BookShort};
pub use book_instance::{BookInstance, BookInstanceDetails, LoanState, LoanStatus, LoanTransition};
pub use genre::Genre;
pub use language::Language;
pub use pagination::{PageQuery, PageRequest};
pub use session::SessionContext;
pub use user::{Permission, User, UserClaims};
