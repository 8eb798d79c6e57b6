//! Repository layer for database operations

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod languages;

use sqlx::{Pool, Postgres};

pub use book_instances::BookInstanceStore;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub genres: genres::GenresRepository,
    pub languages: languages::LanguagesRepository,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub book_instances: book_instances::BookInstancesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            genres: genres::GenresRepository::new(pool.clone()),
            languages: languages::LanguagesRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, for readiness checks
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Report a unique constraint violation as a conflict
pub(crate) fn conflict_on_duplicate(error: sqlx::Error, message: impl FnOnce() -> String) -> crate::error::AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            crate::error::AppError::Conflict(message())
        }
        _ => crate::error::AppError::Database(error),
    }
}

/// Report a foreign key violation as a conflict, e.g. a row gaining
/// dependents between a check and the statement it guarded
pub(crate) fn conflict_on_foreign_key(error: sqlx::Error, message: impl FnOnce() -> String) -> crate::error::AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            crate::error::AppError::Conflict(message())
        }
        _ => crate::error::AppError::Database(error),
    }
}
