//! Borrowed copy listings

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{error::AppResult, models::pagination::PageQuery};

use super::{AuthenticatedUser, LoanPage, PaginatedResponse};

/// Copies lent to the caller, soonest due first
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's borrowed copies", body = LoanPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LoanPage>> {
    let page = query.resolve(&state.config.catalog);
    let (copies, total) = state
        .services
        .loans
        .list_borrowed_by(claims.user_id, page)
        .await?;
    Ok(Json(PaginatedResponse::new(copies, total, page)))
}

/// Every copy on loan, soonest due first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All borrowed copies", body = LoanPage),
        (status = 403, description = "Permission can_mark_returned required")
    )
)]
pub async fn list_all_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LoanPage>> {
    claims.require_mark_returned()?;

    let page = query.resolve(&state.config.catalog);
    let (copies, total) = state.services.loans.list_all_borrowed(page).await?;
    Ok(Json(PaginatedResponse::new(copies, total, page)))
}
