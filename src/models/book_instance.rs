//! Book instances (borrowable copies) and their loan state machine.
//!
//! A copy is persisted as a flat `(status, borrower_id, due_back)` triple.
//! Inside the application the same information is handled as a
//! [`LoanState`], where only `OnLoan` carries a borrower and a due date, and
//! every change goes through [`LoanState::apply`].

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Availability of a copy, stored as a one character code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Being processed or repaired; the state of every new copy
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    /// Legal transitions between statuses.
    ///
    /// `OnLoan -> OnLoan` is a renewal.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        use LoanStatus::*;

        matches!(
            (self, next),
            (Maintenance, Available)
                | (Available, OnLoan)
                | (OnLoan, Available)
                | (OnLoan, OnLoan)
                | (Available, Reserved)
                | (Reserved, OnLoan)
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (TEXT column holding the code)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

// ---------------------------------------------------------------------------
// LoanState / LoanTransition
// ---------------------------------------------------------------------------

/// Loan state of a copy; only a copy on loan has a borrower and a due date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoanState {
    #[default]
    Maintenance,
    Available,
    Reserved,
    OnLoan { borrower_id: i32, due_back: NaiveDate },
}

/// Librarian actions on a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanTransition {
    /// Copy processed and put on the shelf
    Shelve,
    /// Lend the copy, from the shelf or to the reader holding it
    Checkout { borrower_id: i32, due_back: NaiveDate },
    Return,
    /// Move the due date of a copy on loan; the borrower stays the same
    Renew { due_back: NaiveDate },
    /// Put an available copy on hold
    Reserve,
}

impl LoanTransition {
    pub fn name(&self) -> &'static str {
        match self {
            LoanTransition::Shelve => "shelve",
            LoanTransition::Checkout { .. } => "checkout",
            LoanTransition::Return => "return",
            LoanTransition::Renew { .. } => "renew",
            LoanTransition::Reserve => "reserve",
        }
    }

    /// Status a copy ends up in after this transition
    pub fn target(&self) -> LoanStatus {
        match self {
            LoanTransition::Shelve | LoanTransition::Return => LoanStatus::Available,
            LoanTransition::Checkout { .. } | LoanTransition::Renew { .. } => LoanStatus::OnLoan,
            LoanTransition::Reserve => LoanStatus::Reserved,
        }
    }
}

impl LoanState {
    /// Rebuild the state from its stored columns.
    pub fn from_parts(
        status: LoanStatus,
        borrower_id: Option<i32>,
        due_back: Option<NaiveDate>,
    ) -> AppResult<Self> {
        Ok(match status {
            LoanStatus::Maintenance => LoanState::Maintenance,
            LoanStatus::Available => LoanState::Available,
            LoanStatus::Reserved => LoanState::Reserved,
            LoanStatus::OnLoan => match (borrower_id, due_back) {
                (Some(borrower_id), Some(due_back)) => LoanState::OnLoan { borrower_id, due_back },
                _ => {
                    return Err(AppError::Internal(
                        "Copy on loan without borrower or due date".to_string(),
                    ))
                }
            },
        })
    }

    pub fn status(&self) -> LoanStatus {
        match self {
            LoanState::Maintenance => LoanStatus::Maintenance,
            LoanState::Available => LoanStatus::Available,
            LoanState::Reserved => LoanStatus::Reserved,
            LoanState::OnLoan { .. } => LoanStatus::OnLoan,
        }
    }

    pub fn borrower_id(&self) -> Option<i32> {
        match self {
            LoanState::OnLoan { borrower_id, .. } => Some(*borrower_id),
            _ => None,
        }
    }

    pub fn due_back(&self) -> Option<NaiveDate> {
        match self {
            LoanState::OnLoan { due_back, .. } => Some(*due_back),
            _ => None,
        }
    }

    /// Compute the state reached by `transition`, or reject it.
    pub fn apply(&self, transition: LoanTransition) -> AppResult<LoanState> {
        use LoanTransition::*;

        let next = match (*self, transition) {
            (LoanState::Maintenance, Shelve) => LoanState::Available,
            (LoanState::Available | LoanState::Reserved, Checkout { borrower_id, due_back }) => {
                LoanState::OnLoan { borrower_id, due_back }
            }
            (LoanState::OnLoan { .. }, Return) => LoanState::Available,
            (LoanState::OnLoan { borrower_id, .. }, Renew { due_back }) => {
                LoanState::OnLoan { borrower_id, due_back }
            }
            (LoanState::Available, Reserve) => LoanState::Reserved,
            (current, transition) => {
                return Err(AppError::BusinessRule(format!(
                    "Cannot {} a copy whose status is {} ({} -> {} not allowed)",
                    transition.name(),
                    current.status(),
                    current.status(),
                    transition.target()
                )))
            }
        };

        debug_assert!(self.status().can_transition_to(next.status()));
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// BookInstance
// ---------------------------------------------------------------------------

/// Copy model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Unique id for this copy across the whole library
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl BookInstance {
    pub fn loan_state(&self) -> AppResult<LoanState> {
        LoanState::from_parts(self.status, self.borrower_id, self.due_back)
    }

    /// Same copy with its loan columns replaced by `state`
    pub fn with_state(self, state: LoanState) -> Self {
        Self {
            status: state.status(),
            borrower_id: state.borrower_id(),
            due_back: state.due_back(),
            ..self
        }
    }

    /// A copy is overdue once its due date has passed, whatever its status.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Utc::now().date_naive())
    }
}

fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map(|due| due < today).unwrap_or(false)
}

/// Copy joined with its book title and borrower, for lists and detail pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstanceDetails {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
    pub status: LoanStatus,
    /// Computed on read
    #[sqlx(default)]
    pub is_overdue: bool,
}

impl BookInstanceDetails {
    /// Fill in `is_overdue` for the given day
    pub fn checked_on(mut self, today: NaiveDate) -> Self {
        self.is_overdue = is_overdue(self.due_back, today);
        self
    }

    /// "{id} ({title})"
    pub fn label(&self) -> String {
        format!("{} ({})", self.id, self.book_title)
    }
}

/// Create copy request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: String,
}

impl CreateBookInstance {
    /// Same request with surrounding whitespace removed, as it is stored
    pub fn trimmed(&self) -> Self {
        Self {
            imprint: self.imprint.trim().to_string(),
        }
    }
}

/// Checkout request (also used to fulfil a hold)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub borrower_id: i32,
    /// Defaults to three weeks from today
    pub due_back: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(status: LoanStatus, due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: 1,
            imprint: "Penguin, 1999".into(),
            due_back,
            borrower_id: due_back.map(|_| 7),
            status,
        }
    }

    #[test]
    fn test_status_codes() {
        for status in LoanStatus::ALL {
            assert_eq!(status.code().parse::<LoanStatus>(), Ok(status));
        }
        assert!("x".parse::<LoanStatus>().is_err());
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(LoanStatus::OnLoan).unwrap(), "on_loan");
    }

    #[test]
    fn test_transition_table() {
        use LoanStatus::*;

        let legal = [
            (Maintenance, Available),
            (Available, OnLoan),
            (OnLoan, Available),
            (OnLoan, OnLoan),
            (Available, Reserved),
            (Reserved, OnLoan),
        ];
        for from in LoanStatus::ALL {
            for to in LoanStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_checkout_and_return() {
        let due = date(2024, 3, 1);
        let on_loan = LoanState::Available
            .apply(LoanTransition::Checkout { borrower_id: 3, due_back: due })
            .unwrap();
        assert_eq!(on_loan, LoanState::OnLoan { borrower_id: 3, due_back: due });

        let back = on_loan.apply(LoanTransition::Return).unwrap();
        assert_eq!(back, LoanState::Available);
        assert_eq!(back.borrower_id(), None);
        assert_eq!(back.due_back(), None);
    }

    #[test]
    fn test_renew_keeps_borrower() {
        let state = LoanState::OnLoan { borrower_id: 3, due_back: date(2024, 3, 1) };
        let renewed = state
            .apply(LoanTransition::Renew { due_back: date(2024, 3, 15) })
            .unwrap();
        assert_eq!(renewed, LoanState::OnLoan { borrower_id: 3, due_back: date(2024, 3, 15) });
    }

    #[test]
    fn test_hold_fulfilment() {
        let reserved = LoanState::Available.apply(LoanTransition::Reserve).unwrap();
        assert_eq!(reserved, LoanState::Reserved);
        let lent = reserved
            .apply(LoanTransition::Checkout { borrower_id: 9, due_back: date(2024, 5, 1) })
            .unwrap();
        assert_eq!(lent.status(), LoanStatus::OnLoan);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let due = date(2024, 3, 1);
        let checkout = LoanTransition::Checkout { borrower_id: 1, due_back: due };
        let cases = [
            (LoanState::Maintenance, checkout),
            (LoanState::Maintenance, LoanTransition::Reserve),
            (LoanState::Maintenance, LoanTransition::Return),
            (LoanState::Available, LoanTransition::Shelve),
            (LoanState::Available, LoanTransition::Return),
            (LoanState::Available, LoanTransition::Renew { due_back: due }),
            (LoanState::Reserved, LoanTransition::Renew { due_back: due }),
            (LoanState::Reserved, LoanTransition::Reserve),
            (LoanState::OnLoan { borrower_id: 1, due_back: due }, checkout),
            (LoanState::OnLoan { borrower_id: 1, due_back: due }, LoanTransition::Reserve),
            (LoanState::OnLoan { borrower_id: 1, due_back: due }, LoanTransition::Shelve),
        ];
        for (state, transition) in cases {
            assert!(
                matches!(state.apply(transition), Err(AppError::BusinessRule(_))),
                "{:?} / {:?}",
                state,
                transition
            );
        }
    }

    #[test]
    fn test_illegal_transition_message() {
        match LoanState::Maintenance.apply(LoanTransition::Reserve) {
            Err(AppError::BusinessRule(message)) => {
                assert_eq!(
                    message,
                    "Cannot reserve a copy whose status is Maintenance (Maintenance -> Reserved not allowed)"
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_transition_targets_are_legal_edges() {
        let due = date(2024, 3, 1);
        let state = LoanState::OnLoan { borrower_id: 1, due_back: due };
        for transition in [LoanTransition::Return, LoanTransition::Renew { due_back: due }] {
            assert_eq!(state.apply(transition).unwrap().status(), transition.target());
        }
    }

    #[test]
    fn test_on_loan_requires_borrower_and_due_date() {
        assert!(LoanState::from_parts(LoanStatus::OnLoan, Some(1), None).is_err());
        assert!(LoanState::from_parts(LoanStatus::OnLoan, None, Some(date(2024, 1, 1))).is_err());
        assert_eq!(
            LoanState::from_parts(LoanStatus::Reserved, None, None).unwrap(),
            LoanState::Reserved
        );
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2024, 1, 2);
        assert!(instance(LoanStatus::OnLoan, Some(date(2024, 1, 1))).is_overdue_on(today));
        assert!(!instance(LoanStatus::OnLoan, Some(today)).is_overdue_on(today));
        assert!(!instance(LoanStatus::OnLoan, Some(date(2024, 2, 1))).is_overdue_on(today));
        for status in LoanStatus::ALL {
            assert!(!instance(status, None).is_overdue_on(today));
        }
    }

    #[test]
    fn test_with_state_rewrites_loan_columns() {
        let due = date(2024, 4, 4);
        let copy = instance(LoanStatus::Available, None)
            .with_state(LoanState::OnLoan { borrower_id: 5, due_back: due });
        assert_eq!(copy.status, LoanStatus::OnLoan);
        assert_eq!(copy.borrower_id, Some(5));
        assert_eq!(copy.due_back, Some(due));
        assert_eq!(copy.loan_state().unwrap().due_back(), Some(due));
    }

    #[test]
    fn test_details_label_and_overdue() {
        let id = Uuid::new_v4();
        let details = BookInstanceDetails {
            id,
            book_id: 1,
            book_title: "Memórias Póstumas".into(),
            imprint: "Garnier".into(),
            due_back: Some(date(2024, 1, 1)),
            borrower_id: Some(2),
            borrower_username: Some("reader".into()),
            status: LoanStatus::OnLoan,
            is_overdue: false,
        }
        .checked_on(date(2024, 1, 2));
        assert!(details.is_overdue);
        assert_eq!(details.label(), format!("{} (Memórias Póstumas)", id));
    }
}
