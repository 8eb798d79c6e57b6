//! API integration tests
//!
//! Run against a live server sharing this process's JWT secret, with at
//! least one row in `users`:
//! `JWT_SECRET=... cargo test --test api_tests -- --ignored`

use chrono::{Duration, Utc};
use local_library::models::user::{Permission, UserClaims};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Mint a token the server accepts
fn token(permissions: Vec<Permission>) -> String {
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".into());
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "librarian".into(),
        user_id: borrower_id(),
        permissions,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

fn librarian() -> String {
    token(vec![Permission::CanMarkReturned, Permission::CanManageCatalog])
}

fn borrower_id() -> i32 {
    std::env::var("LIBRARY_TEST_BORROWER_ID")
        .ok()
        .and_then(|id| id.parse().ok())
        .unwrap_or(1)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?per_page=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert_eq!(body["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_my_loans_unauthorized() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/mine", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_all_loans_forbidden_without_permission() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .bearer_auth(token(vec![]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_author_death_before_birth_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(librarian())
        .json(&json!({
            "first_name": "Lima",
            "last_name": "Barreto",
            "date_of_birth": "1922-11-01",
            "date_of_death": "1881-05-13"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["field"], "date_of_death");
}

/// Catalog a book, lend a copy, renew it, return it
#[tokio::test]
#[ignore]
async fn test_loan_workflow() {
    let client = Client::new();
    let token = librarian();

    let author: Value = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "Joaquim Maria",
            "last_name": "Machado de Assis",
            "date_of_birth": "1839-06-21",
            "date_of_death": "1908-09-29"
        }))
        .send()
        .await
        .expect("Failed to create author")
        .json()
        .await
        .expect("Failed to parse author");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Memórias Póstumas de Brás Cubas",
            "summary": "A dead man tells his life.",
            "isbn": "9788535910667",
            "author_id": author["id"]
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse book");

    let copy: Value = client
        .post(format!("{}/books/{}/instances", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .json(&json!({ "imprint": "Tipografia Nacional, 1881" }))
        .send()
        .await
        .expect("Failed to create copy")
        .json()
        .await
        .expect("Failed to parse copy");
    assert_eq!(copy["status"], "maintenance");
    let copy_url = format!("{}/instances/{}", BASE_URL, copy["id"].as_str().unwrap());

    // Renewing a copy that is not on loan is an illegal transition
    let today = Utc::now().date_naive();
    let response = client
        .post(format!("{}/renew", copy_url))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": today + Duration::days(7) }))
        .send()
        .await
        .expect("Failed to send renewal");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .post(format!("{}/shelve", copy_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to shelve");
    assert!(response.status().is_success());

    let lent: Value = client
        .post(format!("{}/checkout", copy_url))
        .bearer_auth(&token)
        .json(&json!({ "borrower_id": borrower_id() }))
        .send()
        .await
        .expect("Failed to check out")
        .json()
        .await
        .expect("Failed to parse checkout");
    assert_eq!(lent["status"], "on_loan");

    let response = client
        .post(format!("{}/renew", copy_url))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": today - Duration::days(1) }))
        .send()
        .await
        .expect("Failed to send renewal");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["message"], "invalid date, renewal in the past");

    let renewal_date = today + Duration::days(21);
    let renewed: Value = client
        .post(format!("{}/renew", copy_url))
        .bearer_auth(&token)
        .json(&json!({ "renewal_date": renewal_date }))
        .send()
        .await
        .expect("Failed to renew")
        .json()
        .await
        .expect("Failed to parse renewal");
    assert_eq!(renewed["redirect_to"], "/api/v1/loans");
    assert_eq!(renewed["instance"]["due_back"], renewal_date.to_string());
    assert_eq!(renewed["instance"]["status"], "on_loan");

    let returned: Value = client
        .post(format!("{}/return", copy_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to return")
        .json()
        .await
        .expect("Failed to parse return");
    assert_eq!(returned["status"], "available");
    assert!(returned["borrower_id"].is_null());

    // Book with copies cannot be deleted
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send delete");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
