//! Users (borrowers) and the claims carried by their access tokens

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Library member who can borrow copies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Permissions granted to a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Librarian loan desk: returns, renewals, all borrowed copies
    CanMarkReturned,
    /// Create, edit and delete catalog records
    CanManageCatalog,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "can_mark_returned",
            Permission::CanManageCatalog => "can_manage_catalog",
        }
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username
    pub sub: String,
    pub user_id: i32,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    // Authorization guards
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Permission {} required",
                permission.as_str()
            )))
        }
    }

    pub fn require_mark_returned(&self) -> Result<(), AppError> {
        self.require(Permission::CanMarkReturned)
    }

    pub fn require_manage_catalog(&self) -> Result<(), AppError> {
        self.require(Permission::CanManageCatalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(permissions: Vec<Permission>) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "librarian".into(),
            user_id: 1,
            permissions,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = claims(vec![Permission::CanMarkReturned])
            .create_token("secret")
            .unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 1);
        assert_eq!(parsed.permissions, vec![Permission::CanMarkReturned]);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut expired = claims(vec![]);
        expired.exp = Utc::now().timestamp() - 3600;
        let token = expired.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_guards() {
        let reader = claims(vec![]);
        assert!(matches!(reader.require_mark_returned(), Err(AppError::Authorization(_))));
        assert!(matches!(reader.require_manage_catalog(), Err(AppError::Authorization(_))));

        let librarian = claims(vec![Permission::CanMarkReturned]);
        assert!(librarian.require_mark_returned().is_ok());
        assert!(librarian.require_manage_catalog().is_err());
    }

    #[test]
    fn test_permissions_default_to_empty() {
        let parsed: UserClaims =
            serde_json::from_str(r#"{"sub":"reader","user_id":4,"exp":0,"iat":0}"#).unwrap();
        assert!(parsed.permissions.is_empty());
    }
}
