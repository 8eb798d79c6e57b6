//! Book instances (copies) repository.
//!
//! The loan workflow talks to this repository through the
//! [`BookInstanceStore`] trait so it can run against a mock in tests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstance, BookInstanceDetails, LoanState, LoanStatus},
        pagination::PageRequest,
        user::User,
    },
};

const INSTANCE_COLUMNS: &str = "id, book_id, imprint, due_back, borrower_id, status";

const DETAILS_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
           bi.borrower_id, u.username AS borrower_username, bi.status
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

/// Persistence operations the loan workflow depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstanceStore: Send + Sync {
    /// Get copy by ID
    async fn get(&self, id: Uuid) -> AppResult<BookInstance>;

    /// Get copy with book title and borrower name
    async fn get_details(&self, id: Uuid) -> AppResult<BookInstanceDetails>;

    /// Add a new copy of a book, in maintenance
    async fn create(&self, book_id: i32, imprint: &str) -> AppResult<BookInstance>;

    /// Store `next` only if the copy is still in `expected`.
    ///
    /// Returns false when another request changed the copy first.
    async fn compare_and_set(&self, id: Uuid, expected: LoanState, next: LoanState)
        -> AppResult<bool>;

    /// Copies on loan, optionally for a single borrower, soonest due first
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)>;

    /// Get borrower by ID
    async fn get_borrower(&self, user_id: i32) -> AppResult<User>;
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All copies of a book
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstanceDetails>> {
        let copies = sqlx::query_as::<_, BookInstanceDetails>(&format!(
            "{} WHERE bi.book_id = $1 ORDER BY bi.due_back NULLS LAST, bi.id",
            DETAILS_SELECT
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl BookInstanceStore for BookInstancesRepository {
    async fn get(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(&format!(
            "SELECT {} FROM book_instances WHERE id = $1",
            INSTANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn get_details(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        sqlx::query_as::<_, BookInstanceDetails>(&format!("{} WHERE bi.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn create(&self, book_id: i32, imprint: &str) -> AppResult<BookInstance> {
        let book_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(book_id)
                .fetch_one(&self.pool)
                .await?;

        if !book_exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let copy = sqlx::query_as::<_, BookInstance>(&format!(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(imprint)
        .bind(LoanStatus::default())
        .fetch_one(&self.pool)
        .await?;

        Ok(copy)
    }

    async fn compare_and_set(
        &self,
        id: Uuid,
        expected: LoanState,
        next: LoanState,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET status = $1, borrower_id = $2, due_back = $3
            WHERE id = $4
              AND status = $5
              AND borrower_id IS NOT DISTINCT FROM $6
              AND due_back IS NOT DISTINCT FROM $7
            "#,
        )
        .bind(next.status())
        .bind(next.borrower_id())
        .bind(next.due_back())
        .bind(id)
        .bind(expected.status())
        .bind(expected.borrower_id())
        .bind(expected.due_back())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::int4 IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let copies = sqlx::query_as::<_, BookInstanceDetails>(&format!(
            r#"
            {}
            WHERE bi.status = $1 AND ($2::int4 IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back, bi.id
            LIMIT $3 OFFSET $4
            "#,
            DETAILS_SELECT
        ))
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((copies, total))
    }

    async fn get_borrower(&self, user_id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
    }
}
