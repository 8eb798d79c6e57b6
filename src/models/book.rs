//! Book (catalog entry) model and related types.
//!
//! A `Book` is the bibliographic record; the copies readers actually borrow
//! are `BookInstance`s.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, book_instance::BookInstanceDetails, genre::Genre, language::Language};

/// Number of genres shown in the compact genre string
const DISPLAYED_GENRES: usize = 3;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
}

/// Short book representation for lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// Author display name ("Last, First")
    pub author_name: Option<String>,
}

/// Book with its relations, for the detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<Author>,
    pub language: Option<Language>,
    /// Genres in stored order
    pub genres: Vec<Genre>,
    /// First genres joined with ", "
    pub display_genre: String,
    /// Physical copies of this book
    pub instances: Vec<BookInstanceDetails>,
}

impl BookDetails {
    pub fn new(
        book: Book,
        author: Option<Author>,
        language: Option<Language>,
        genres: Vec<Genre>,
        instances: Vec<BookInstanceDetails>,
    ) -> Self {
        Self {
            id: book.id,
            display_genre: display_genre(&genres),
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres,
            instances,
        }
    }
}

/// Comma-separated names of the first three genres, in stored order.
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(DISPLAYED_GENRES)
        .map(|genre| genre.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create or replace book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    /// Brief description of the book
    #[serde(default)]
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    /// Genre ids, in display order
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    /// Same form with surrounding whitespace removed, as it is stored
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            ..self.clone()
        }
    }
}
