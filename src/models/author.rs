//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookShort;
use crate::error::{AppError, AppResult};

/// Author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

/// Author with their books, for the detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    pub author: Author,
    /// Display name ("Last, First")
    pub name: String,
    pub books: Vec<BookShort>,
}

/// Create or replace author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Must not precede the date of birth
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Field constraints plus the lifespan rule
    pub fn check(&self) -> AppResult<()> {
        self.trimmed().validate()?;
        check_lifespan(self.date_of_birth, self.date_of_death)
    }

    /// Same form with surrounding whitespace removed, as it is stored
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            ..self.clone()
        }
    }
}

/// A date of death, when both dates are known, may not precede the date of birth.
pub fn check_lifespan(born: Option<NaiveDate>, died: Option<NaiveDate>) -> AppResult<()> {
    match (born, died) {
        (Some(born), Some(died)) if died < born => Err(AppError::InvalidField {
            field: "date_of_death",
            message: format!("date of death {} is before date of birth {}", died, born),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form() -> AuthorForm {
        AuthorForm {
            first_name: "Ursula".into(),
            last_name: "Le Guin".into(),
            date_of_birth: Some(date(1929, 10, 21)),
            date_of_death: Some(date(2018, 1, 22)),
        }
    }

    #[test]
    fn test_display() {
        let author = Author {
            id: 1,
            first_name: "Machado".into(),
            last_name: "de Assis".into(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert_eq!(author.to_string(), "de Assis, Machado");
    }

    #[test]
    fn test_lifespan() {
        assert!(form().check().is_ok());

        let mut reversed = form();
        reversed.date_of_death = Some(date(1900, 1, 1));
        assert!(matches!(
            reversed.check(),
            Err(AppError::InvalidField { field: "date_of_death", .. })
        ));

        // same day is allowed, and a missing date disables the check
        assert!(check_lifespan(Some(date(1950, 5, 5)), Some(date(1950, 5, 5))).is_ok());
        assert!(check_lifespan(None, Some(date(1900, 1, 1))).is_ok());
        assert!(check_lifespan(Some(date(1900, 1, 1)), None).is_ok());
    }

    #[test]
    fn test_names_required() {
        let mut blank = form();
        blank.last_name = String::new();
        assert!(matches!(blank.check(), Err(AppError::Validation(_))));

        let mut spaces = form();
        spaces.first_name = "  ".into();
        assert!(matches!(spaces.check(), Err(AppError::Validation(_))));
    }
}
