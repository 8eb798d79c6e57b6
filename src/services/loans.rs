//! Loan desk service: copies, their loan transitions and renewals

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstance, BookInstanceDetails, CreateBookInstance, LoanTransition},
        pagination::PageRequest,
        renewal::{self, RenewalProposal, RENEWAL_HELP_TEXT},
    },
    repository::BookInstanceStore,
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn BookInstanceStore>,
}

impl LoansService {
    pub fn new(store: Arc<dyn BookInstanceStore>) -> Self {
        Self { store }
    }

    /// Get a copy with its overdue flag
    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        Ok(self.store.get_details(id).await?.checked_on(today()))
    }

    /// Add a copy of a book; new copies start in maintenance
    pub async fn create_instance(
        &self,
        book_id: i32,
        data: &CreateBookInstance,
    ) -> AppResult<BookInstance> {
        let data = data.trimmed();
        data.validate()?;
        let copy = self.store.create(book_id, &data.imprint).await?;
        tracing::info!(instance_id = %copy.id, book_id, "copy added");
        Ok(copy)
    }

    /// Copies currently lent to one reader
    pub async fn list_borrowed_by(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        self.list_on_loan(Some(user_id), page).await
    }

    /// Every copy currently on loan
    pub async fn list_all_borrowed(
        &self,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        self.list_on_loan(None, page).await
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let today = today();
        let (copies, total) = self.store.list_on_loan(borrower_id, page).await?;
        Ok((
            copies.into_iter().map(|copy| copy.checked_on(today)).collect(),
            total,
        ))
    }

    // =========================================================================
    // RENEWAL
    // =========================================================================

    /// Initial values for the renewal form
    pub async fn renewal_proposal(&self, id: Uuid) -> AppResult<RenewalProposal> {
        self.renewal_proposal_on(id, today()).await
    }

    pub async fn renewal_proposal_on(&self, id: Uuid, today: NaiveDate) -> AppResult<RenewalProposal> {
        let copy = self.store.get(id).await?;
        Ok(RenewalProposal {
            instance_id: copy.id,
            current_due_back: copy.due_back,
            proposed_renewal_date: renewal::default_renewal_date(today),
            help_text: RENEWAL_HELP_TEXT.to_string(),
        })
    }

    /// Move the due date of a copy on loan
    pub async fn renew(&self, id: Uuid, renewal_date: NaiveDate) -> AppResult<BookInstanceDetails> {
        self.renew_on(id, renewal_date, today()).await
    }

    pub async fn renew_on(
        &self,
        id: Uuid,
        renewal_date: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<BookInstanceDetails> {
        let copy = self.store.get(id).await?;
        let due_back = renewal::validate_renewal_date(renewal_date, today)?;
        self.apply(copy, LoanTransition::Renew { due_back }, today).await
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Put a processed copy on the shelf
    pub async fn shelve(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        self.transition(id, LoanTransition::Shelve, today()).await
    }

    /// Lend an available or reserved copy
    pub async fn checkout(
        &self,
        id: Uuid,
        borrower_id: i32,
        due_back: Option<NaiveDate>,
    ) -> AppResult<BookInstanceDetails> {
        self.checkout_on(id, borrower_id, due_back, today()).await
    }

    pub async fn checkout_on(
        &self,
        id: Uuid,
        borrower_id: i32,
        due_back: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<BookInstanceDetails> {
        let copy = self.store.get(id).await?;

        let due_back = due_back.unwrap_or_else(|| renewal::default_renewal_date(today));
        renewal::validate_renewal_date(due_back, today).map_err(|e| e.for_field("due_back"))?;

        let borrower = self.store.get_borrower(borrower_id).await.map_err(|e| match e {
            AppError::NotFound(message) => AppError::InvalidField {
                field: "borrower_id",
                message,
            },
            other => other,
        })?;

        tracing::debug!(instance_id = %id, borrower = %borrower.username, "checking out copy");
        self.apply(copy, LoanTransition::Checkout { borrower_id, due_back }, today)
            .await
    }

    /// Take back a copy on loan
    pub async fn return_copy(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        self.transition(id, LoanTransition::Return, today()).await
    }

    /// Hold an available copy
    pub async fn reserve(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        self.transition(id, LoanTransition::Reserve, today()).await
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: LoanTransition,
        today: NaiveDate,
    ) -> AppResult<BookInstanceDetails> {
        let copy = self.store.get(id).await?;
        self.apply(copy, transition, today).await
    }

    /// Validate the transition against the copy's state and persist it
    /// atomically.
    async fn apply(
        &self,
        copy: BookInstance,
        transition: LoanTransition,
        today: NaiveDate,
    ) -> AppResult<BookInstanceDetails> {
        let current = copy.loan_state()?;
        let next = current.apply(transition)?;

        if !self.store.compare_and_set(copy.id, current, next).await? {
            return Err(AppError::Conflict(format!(
                "Book instance {} was modified concurrently, reload and retry",
                copy.id
            )));
        }

        tracing::info!(
            instance_id = %copy.id,
            action = transition.name(),
            from = %current.status(),
            to = %next.status(),
            "loan state changed"
        );

        Ok(self.store.get_details(copy.id).await?.checked_on(today))
    }
}
