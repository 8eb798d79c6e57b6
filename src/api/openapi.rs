//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, catalog, health, index, instances, loans};

/// Registers the bearer JWT scheme referenced by `security(("bearer_auth" = []))`
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "1.0.0",
        description = "Library catalog and loan desk REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Home
        index::index,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::create_instance,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Genres and languages
        catalog::list_genres,
        catalog::create_genre,
        catalog::list_languages,
        catalog::create_language,
        // Copies
        instances::get_instance,
        instances::renewal_form,
        instances::renew_instance,
        instances::shelve_instance,
        instances::checkout_instance,
        instances::return_instance,
        instances::reserve_instance,
        // Loans
        loans::list_my_loans,
        loans::list_all_loans,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookDetails,
            crate::models::book::BookForm,
            crate::api::BookPage,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorForm,
            crate::api::AuthorPage,
            // Genres and languages
            crate::models::genre::Genre,
            crate::models::genre::CreateGenre,
            crate::models::language::Language,
            crate::models::language::CreateLanguage,
            // Copies
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BookInstanceDetails,
            crate::models::book_instance::CreateBookInstance,
            crate::models::book_instance::CheckoutRequest,
            crate::models::renewal::RenewBookForm,
            crate::models::renewal::RenewalProposal,
            crate::models::renewal::RenewalResponse,
            crate::api::LoanPage,
            // Home
            index::IndexResponse,
            crate::services::stats::CatalogCounts,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "index", description = "Home page counts"),
        (name = "books", description = "Book management"),
        (name = "authors", description = "Author management"),
        (name = "catalog", description = "Genres and languages"),
        (name = "instances", description = "Book copies and the loan workflow"),
        (name = "loans", description = "Borrowed copies")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_renewal_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/instances/{id}/renew"));
        assert!(doc.paths.paths.contains_key("/loans/mine"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("BookPage"));
    }
}
