//! API handlers for the library REST endpoints

pub mod authors;
pub mod books;
pub mod catalog;
pub mod health;
pub mod index;
pub mod instances;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        author::Author, book::BookShort, book_instance::BookInstanceDetails,
        pagination::PageRequest, user::UserClaims,
    },
    AppState,
};

/// Header carrying the client's session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Session id sent by the client, or a fresh one when it sent none
pub struct SessionId {
    pub id: Uuid,
    /// True when the id was generated for this request
    pub issued: bool,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let sent = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        Ok(match sent {
            Some(id) => SessionId { id, issued: false },
            None => SessionId {
                id: Uuid::new_v4(),
                issued: true,
            },
        })
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    BookPage = PaginatedResponse<BookShort>,
    AuthorPage = PaginatedResponse<Author>,
    LoanPage = PaginatedResponse<BookInstanceDetails>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Records on this page
    pub items: Vec<T>,
    /// Total number of records
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Records per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Home
        .route("/", get(index::index))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/instances", post(books::create_instance))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Genres and languages
        .route("/genres", get(catalog::list_genres).post(catalog::create_genre))
        .route("/languages", get(catalog::list_languages).post(catalog::create_language))
        // Copies
        .route("/instances/:id", get(instances::get_instance))
        .route(
            "/instances/:id/renew",
            get(instances::renewal_form).post(instances::renew_instance),
        )
        .route("/instances/:id/shelve", post(instances::shelve_instance))
        .route("/instances/:id/checkout", post(instances::checkout_instance))
        .route("/instances/:id/return", post(instances::return_instance))
        .route("/instances/:id/reserve", post(instances::reserve_instance))
        // Loans
        .route("/loans", get(loans::list_all_loans))
        .route("/loans/mine", get(loans::list_my_loans))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
