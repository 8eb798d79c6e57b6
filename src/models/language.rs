//! Language model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Natural language a book is written in (English, French, Japanese...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Create language request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLanguage {
    #[validate(length(min = 1, max = 200, message = "Language name must be 1 to 200 characters"))]
    pub name: String,
}

impl CreateLanguage {
    /// Same request with surrounding whitespace removed, as it is stored
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected_once_trimmed() {
        assert!(CreateLanguage { name: " \t ".into() }.trimmed().validate().is_err());
        assert_eq!(CreateLanguage { name: " Portuguese ".into() }.trimmed().name, "Portuguese");
    }
}
