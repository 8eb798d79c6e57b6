//! Home page: catalog counts and the session visit counter

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppResult, services::stats::CatalogCounts};

use super::{AuthenticatedUser, SessionId};

#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    pub counts: CatalogCounts,
    /// Visits this session made before the current one
    pub num_visits: i64,
    /// Session id to send back in `x-session-id`
    pub session_id: Uuid,
    /// True when the request carried no usable session id
    pub session_issued: bool,
}

/// Catalog counts for the home page
#[utoipa::path(
    get,
    path = "/",
    tag = "index",
    security(("bearer_auth" = [])),
    params(
        ("x-session-id" = Option<Uuid>, Header, description = "Session id from a previous response")
    ),
    responses(
        (status = 200, description = "Catalog counts", body = IndexResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    session: SessionId,
) -> AppResult<Json<IndexResponse>> {
    let counts = state.services.stats.catalog_counts().await?;
    let num_visits = state.services.sessions.visit(session.id).await?;

    Ok(Json(IndexResponse {
        counts,
        num_visits,
        session_id: session.id,
        session_issued: session.issued,
    }))
}
