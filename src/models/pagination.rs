//! Page parameters shared by list endpoints

use serde::Deserialize;
use utoipa::IntoParams;

use crate::config::CatalogConfig;

/// Raw `?page=&per_page=` query
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default from configuration)
    pub per_page: Option<i64>,
}

/// Resolved page, always within bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageQuery {
    pub fn resolve(&self, config: &CatalogConfig) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(config.page_size)
                .clamp(1, config.max_page_size.max(1)),
        }
    }
}

impl PageRequest {
    /// Rows to skip; pages past the end saturate instead of overflowing
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}
