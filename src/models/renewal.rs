//! Renewal date rule.
//!
//! A librarian may move the due date of a copy on loan to any day from today
//! up to four weeks ahead, both ends included.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::book_instance::BookInstanceDetails;
use crate::error::AppError;

pub const MAX_RENEWAL_WEEKS: i64 = 4;
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;

pub const RENEWAL_HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

/// Why a proposed date was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalError {
    #[error("invalid date, renewal in the past")]
    InPast,
    #[error("invalid date, renewal more than 4 weeks ahead")]
    TooFarAhead,
}

impl RenewalError {
    /// Attach the error to the form field it was raised for
    pub fn for_field(self, field: &'static str) -> AppError {
        AppError::InvalidField {
            field,
            message: self.to_string(),
        }
    }
}

impl From<RenewalError> for AppError {
    fn from(e: RenewalError) -> Self {
        e.for_field("renewal_date")
    }
}

/// Accept `date` if `today <= date <= today + 4 weeks`.
///
/// The past check runs first.
pub fn validate_renewal_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RenewalError> {
    if date < today {
        return Err(RenewalError::InPast);
    }
    if date > today + Duration::weeks(MAX_RENEWAL_WEEKS) {
        return Err(RenewalError::TooFarAhead);
    }
    Ok(date)
}

/// Date proposed when a renewal form is opened
pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

/// Renewal form submission
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// New due date (YYYY-MM-DD)
    pub renewal_date: NaiveDate,
}

/// Initial values of the renewal form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalProposal {
    pub instance_id: Uuid,
    pub current_due_back: Option<NaiveDate>,
    pub proposed_renewal_date: NaiveDate,
    pub help_text: String,
}

/// Accepted renewal
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalResponse {
    pub instance: BookInstanceDetails,
    /// Where a form client should go next
    pub redirect_to: String,
}
