//! Catalog statistics for the home page

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::book_instance::LoanStatus, repository::Repository};

/// Record counts shown on the home page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status Available
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Books whose title contains `keyword`, ignoring case
    pub num_books_matching: i64,
    pub keyword: String,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    highlight_keyword: String,
}

impl StatsService {
    pub fn new(repository: Repository, highlight_keyword: impl Into<String>) -> Self {
        Self {
            repository,
            highlight_keyword: highlight_keyword.into(),
        }
    }

    pub async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        let (num_books, num_instances, num_instances_available, num_authors, num_genres, num_books_matching) = tokio::try_join!(
            self.repository.books.count(),
            self.repository.book_instances.count(),
            self.repository
                .book_instances
                .count_with_status(LoanStatus::Available),
            self.repository.authors.count(),
            self.repository.genres.count(),
            self.repository
                .books
                .count_title_containing(&self.highlight_keyword),
        )?;

        Ok(CatalogCounts {
            num_books,
            num_instances,
            num_instances_available,
            num_authors,
            num_genres,
            num_books_matching,
            keyword: self.highlight_keyword.clone(),
        })
    }
}
