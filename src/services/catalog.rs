//! Catalog management service: books, authors, genres and languages

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorForm},
        book::{Book, BookDetails, BookForm, BookShort},
        genre::{CreateGenre, Genre},
        language::{CreateLanguage, Language},
        pagination::PageRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check the catalog database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// Page of books, by title then author
    pub async fn list_books(&self, page: PageRequest) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.list(page).await
    }

    /// Book with author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get_by_id(language_id).await?),
            None => None,
        };
        let genres = self.repository.genres.list_for_book(id).await?;

        let today = Utc::now().date_naive();
        let instances = self
            .repository
            .book_instances
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|copy| copy.checked_on(today))
            .collect();

        Ok(BookDetails::new(book, author, language, genres, instances))
    }

    pub async fn create_book(&self, data: &BookForm) -> AppResult<Book> {
        let data = self.check_book(data).await?;
        let book = self.repository.books.create(&data).await?;
        tracing::info!(book_id = book.id, title = %book.title, "book created");
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, data: &BookForm) -> AppResult<Book> {
        let data = self.check_book(data).await?;
        self.repository.books.update(id, &data).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    /// Validate a book form and resolve its references.
    ///
    /// Returns the trimmed form with duplicate genre ids removed.
    async fn check_book(&self, data: &BookForm) -> AppResult<BookForm> {
        let data = data.trimmed();
        data.validate()?;

        if let Some(author_id) = data.author_id {
            self.repository
                .authors
                .get_by_id(author_id)
                .await
                .map_err(|e| not_found_as_field(e, "author_id"))?;
        }
        if let Some(language_id) = data.language_id {
            self.repository
                .languages
                .get_by_id(language_id)
                .await
                .map_err(|e| not_found_as_field(e, "language_id"))?;
        }

        let genre_ids = unique_ids(&data.genre_ids);
        if !genre_ids.is_empty() {
            let known = self.repository.genres.count_existing(&genre_ids).await?;
            if known != genre_ids.len() as i64 {
                return Err(AppError::InvalidField {
                    field: "genre_ids",
                    message: "unknown genre".to_string(),
                });
            }
        }

        Ok(BookForm { genre_ids, ..data })
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    /// Page of authors, by last name then first name
    pub async fn list_authors(&self, page: PageRequest) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(page).await
    }

    /// Author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails {
            name: author.to_string(),
            author,
            books,
        })
    }

    pub async fn create_author(&self, data: &AuthorForm) -> AppResult<Author> {
        data.check()?;
        let author = self.repository.authors.create(data).await?;
        tracing::info!(author_id = author.id, name = %author, "author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, data: &AuthorForm) -> AppResult<Author> {
        data.check()?;
        self.repository.authors.update(id, data).await
    }

    /// Delete an author; their books keep existing without one
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // =========================================================================
    // GENRES / LANGUAGES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, data: &CreateGenre) -> AppResult<Genre> {
        let data = data.trimmed();
        data.validate()?;
        self.repository.genres.create(&data).await
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn create_language(&self, data: &CreateLanguage) -> AppResult<Language> {
        let data = data.trimmed();
        data.validate()?;
        self.repository.languages.create(&data).await
    }
}

/// A missing referenced row is the caller's bad input, not a missing resource
fn not_found_as_field(error: AppError, field: &'static str) -> AppError {
    match error {
        AppError::NotFound(message) => AppError::InvalidField { field, message },
        other => other,
    }
}

/// Drop repeated ids, keeping first occurrences in order
fn unique_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
