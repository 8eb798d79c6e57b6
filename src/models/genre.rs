//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book genre (e.g. Science Fiction)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Create genre request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGenre {
    /// Genre name (e.g. Science Fiction)
    #[validate(length(min = 1, max = 200, message = "Genre name must be 1 to 200 characters"))]
    pub name: String,
}

impl CreateGenre {
    /// Same request with surrounding whitespace removed, as it is stored
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}
