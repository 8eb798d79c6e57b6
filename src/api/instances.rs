//! Book copy endpoints: detail, renewal and loan transitions

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstanceDetails, CheckoutRequest},
        renewal::{RenewBookForm, RenewalProposal, RenewalResponse},
    },
};

use super::AuthenticatedUser;

/// Where clients go once a renewal is saved
pub const RENEWAL_REDIRECT: &str = "/api/v1/loans";

/// Get a copy by ID
#[utoipa::path(
    get,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy details", body = BookInstanceDetails),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let copy = state.services.loans.get_instance(id).await?;
    Ok(Json(copy))
}

/// Initial values for the renewal form
#[utoipa::path(
    get,
    path = "/instances/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Proposed renewal date", body = RenewalProposal),
        (status = 403, description = "Permission can_mark_returned required"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalProposal>> {
    claims.require_mark_returned()?;

    let proposal = state.services.loans.renewal_proposal(id).await?;
    Ok(Json(proposal))
}

/// Renew a copy on loan
#[utoipa::path(
    post,
    path = "/instances/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body = RenewBookForm,
    responses(
        (status = 200, description = "Copy renewed", body = RenewalResponse),
        (status = 400, description = "Renewal date out of range", body = crate::error::ErrorResponse),
        (status = 403, description = "Permission can_mark_returned required"),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Copy changed concurrently"),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn renew_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewBookForm>,
) -> AppResult<Json<RenewalResponse>> {
    claims.require_mark_returned()?;

    let instance = state.services.loans.renew(id, form.renewal_date).await?;
    Ok(Json(RenewalResponse {
        instance,
        redirect_to: RENEWAL_REDIRECT.to_string(),
    }))
}

/// Shelve a copy out of maintenance
#[utoipa::path(
    post,
    path = "/instances/{id}/shelve",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy available", body = BookInstanceDetails),
        (status = 422, description = "Copy is not in maintenance")
    )
)]
pub async fn shelve_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_mark_returned()?;

    let copy = state.services.loans.shelve(id).await?;
    Ok(Json(copy))
}

/// Lend an available or reserved copy
#[utoipa::path(
    post,
    path = "/instances/{id}/checkout",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Copy on loan", body = BookInstanceDetails),
        (status = 400, description = "Unknown borrower or due date out of range", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy changed concurrently"),
        (status = 422, description = "Copy cannot be lent")
    )
)]
pub async fn checkout_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_mark_returned()?;

    let copy = state
        .services
        .loans
        .checkout(id, request.borrower_id, request.due_back)
        .await?;
    Ok(Json(copy))
}

/// Take back a copy on loan
#[utoipa::path(
    post,
    path = "/instances/{id}/return",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy available", body = BookInstanceDetails),
        (status = 422, description = "Copy is not on loan")
    )
)]
pub async fn return_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_mark_returned()?;

    let copy = state.services.loans.return_copy(id).await?;
    Ok(Json(copy))
}

/// Hold an available copy
#[utoipa::path(
    post,
    path = "/instances/{id}/reserve",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy reserved", body = BookInstanceDetails),
        (status = 422, description = "Copy is not available")
    )
)]
pub async fn reserve_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_mark_returned()?;

    let copy = state.services.loans.reserve(id).await?;
    Ok(Json(copy))
}
