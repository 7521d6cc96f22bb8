//! API integration tests
//!
//! These tests run against a live server with a fresh database.

use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080";

/// Direct database handle for seeding test fixtures
async fn test_pool() -> sqlx::PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    sqlx::PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// Register a fresh user, mark it verified in the database and log it in.
/// Returns the email and a bearer token.
async fn register_verified(client: &Client, pool: &sqlx::PgPool, role: &str) -> (String, String) {
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());
    let password = "secret123";

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password,
            "name": "Test Reader",
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    sqlx::query("UPDATE users SET is_verified = TRUE WHERE email = $1")
        .bind(&email)
        .execute(pool)
        .await
        .expect("Failed to verify user");

    let token = get_auth_token(client, &email, password).await;
    (email, token)
}

/// A fresh 13-character ISBN; `seed` keeps ISBNs distinct within one test
fn unique_isbn(seed: u32) -> String {
    let n = Utc::now().timestamp_micros().unsigned_abs() % 1_000_000_000;
    format!("978{:09}{}", n, seed % 10)
}

/// Create a single-copy book through the admin API
async fn seed_book(client: &Client, admin_token: &str, isbn: &str) {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(admin_token)
        .json(&json!({
            "title": format!("Seeded Book {}", isbn),
            "isbn": isbn,
            "copies": 1,
            "authors": ["Test Author"],
            "categories": ["Fiction"]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
}

async fn borrow(client: &Client, token: &str, isbn: &str) -> reqwest::Response {
    client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send borrow request")
}

/// Helper to log in and return a bearer token
async fn get_auth_token(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response
        .json()
        .await
        .expect("Failed to parse login response");
    body["token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_ping() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ping", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_short_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": "shortpw@example.com",
            "password": "abc",
            "name": "Short Password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email_conflicts() {
    let client = Client::new();
    let payload = json!({
        "email": "duplicate@example.com",
        "password": "secret123",
        "name": "First Registrant"
    });

    let first = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@libris.org",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore]
async fn test_login_returns_bearer_token() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@libris.org",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], "admin@libris.org");
}

#[tokio::test]
#[ignore]
async fn test_book_search_requires_auth() {
    let client = Client::new();

    let anonymous = client
        .get(format!("{}/books?title=rust", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(anonymous.status(), 401);

    let token = get_auth_token(&client, "member@libris.org", "member123").await;
    let response = client
        .get(format!("{}/books?title=rust", BASE_URL))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let token = get_auth_token(&client, "member@libris.org", "member123").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "Forbidden Book",
            "isbn": "9780000000001",
            "copies": 1,
            "authors": ["Nobody"],
            "categories": ["Fiction"]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_book_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client, "admin@libris.org", "admin123").await;

    // Create
    let created = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Lifecycle Book",
            "isbn": "9780306406157",
            "copies": 2,
            "authors": ["Ada Example"],
            "categories": ["Science"]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), 201);

    let body: Value = created.json().await.expect("Failed to parse response");
    let id = body["id"].as_str().expect("No book id").to_string();

    // Read with details
    let fetched = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(fetched.status().is_success());

    let details: Value = fetched.json().await.expect("Failed to parse response");
    assert_eq!(details["title"], "Lifecycle Book");
    assert_eq!(details["available_copies"], 2);

    // Update
    let updated = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "copies": 5 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(updated.status().is_success());

    // Delete (soft)
    let deleted = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(deleted.status().is_success());

    // Gone from the catalog
    let missing = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let client = Client::new();
    let admin = get_auth_token(&client, "admin@libris.org", "admin123").await;
    let member = get_auth_token(&client, "member@libris.org", "member123").await;

    // Seed a book to borrow
    let created = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({
            "title": "Borrowable Book",
            "isbn": "9781593279509",
            "copies": 1,
            "authors": ["Marijn Example"],
            "categories": ["Programming"]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), 201);

    // Borrow it
    let borrowed = client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({ "isbn": "9781593279509" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(borrowed.status(), 201);

    let record: Value = borrowed.json().await.expect("Failed to parse response");
    let record_id = record["id"].as_str().expect("No borrow id").to_string();
    assert!(record["due_date"].is_string());
    assert!(record["return_date"].is_null());

    // Last copy is out, so a second borrow fails
    let empty = client
        .post(format!("{}/borrow", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "isbn": "9781593279509" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(empty.status(), 404);

    // It shows up in the member's open borrows
    let open = client
        .get(format!("{}/users/borrowed-books", BASE_URL))
        .bearer_auth(&member)
        .send()
        .await
        .expect("Failed to send request");
    let open_body: Value = open.json().await.expect("Failed to parse response");
    assert!(open_body
        .as_array()
        .expect("Expected array")
        .iter()
        .any(|b| b["id"] == record_id.as_str()));

    // Return it
    let returned = client
        .post(format!("{}/borrow/return", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({ "borrowed_book_id": record_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(returned.status().is_success());

    let outcome: Value = returned.json().await.expect("Failed to parse response");
    assert!(outcome["returned_book"]["return_date"].is_string());
    // Returned on time, so no fine
    assert!(outcome["fine"].is_null());

    // Returning the same record twice fails
    let again = client
        .post(format!("{}/borrow/return", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({ "borrowed_book_id": record_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(again.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_pending_fines_requires_auth() {
    let client = Client::new();

    let response = client
        .get(format!("{}/payment/fines/pending", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_pay_unknown_fine_not_found() {
    let client = Client::new();
    let member = get_auth_token(&client, "member@libris.org", "member123").await;

    let response = client
        .post(format!("{}/payment/fines/pay", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({
            "fine_id": "00000000-0000-0000-0000-000000000000",
            "payment_method": "UPI"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_analytics_requires_admin() {
    let client = Client::new();
    let member = get_auth_token(&client, "member@libris.org", "member123").await;

    let response = client
        .get(format!("{}/analytics/reports/monthly", BASE_URL))
        .bearer_auth(&member)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_monthly_report_shape() {
    let client = Client::new();
    let admin = get_auth_token(&client, "admin@libris.org", "admin123").await;

    let response = client
        .get(format!("{}/analytics/reports/monthly", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["period"]["month"].is_string());
    assert!(body["borrowing_stats"]["total_borrows"].is_number());
    assert!(body["user_stats"]["active_users"].is_number());
    // Decimal amounts serialize as strings
    assert!(body["financial_stats"]["pending_amount"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_fourth_borrow_is_rejected() {
    let client = Client::new();
    let pool = test_pool().await;
    let (_, admin) = register_verified(&client, &pool, "ADMIN").await;
    let (_, member) = register_verified(&client, &pool, "MEMBER").await;

    let isbns: Vec<String> = (0..4).map(unique_isbn).collect();
    for isbn in &isbns {
        seed_book(&client, &admin, isbn).await;
    }

    for isbn in &isbns[..3] {
        let response = borrow(&client, &member, isbn).await;
        assert_eq!(response.status(), 201);
    }

    let fourth = borrow(&client, &member, &isbns[3]).await;
    assert_eq!(fourth.status(), 400);

    let body: Value = fourth.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert!(body["error"]["message"]
        .as_str()
        .expect("No error message")
        .contains("3 books"));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_borrow_is_rejected() {
    let client = Client::new();
    let pool = test_pool().await;
    let (_, admin) = register_verified(&client, &pool, "ADMIN").await;
    let (_, member) = register_verified(&client, &pool, "MEMBER").await;

    let isbn = unique_isbn(0);
    // Two copies, so only the duplicate check can reject the second borrow
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({
            "title": "Twice-Wanted Book",
            "isbn": isbn,
            "copies": 2,
            "authors": ["Test Author"],
            "categories": ["Fiction"]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let first = borrow(&client, &member, &isbn).await;
    assert_eq!(first.status(), 201);

    let second = borrow(&client, &member, &isbn).await;
    assert_eq!(second.status(), 400);

    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_respect_limit() {
    let client = Client::new();
    let pool = test_pool().await;
    let (_, admin) = register_verified(&client, &pool, "ADMIN").await;
    let (_, member) = register_verified(&client, &pool, "MEMBER").await;

    let isbns: Vec<String> = (0..4).map(unique_isbn).collect();
    for isbn in &isbns {
        seed_book(&client, &admin, isbn).await;
    }

    for isbn in &isbns[..2] {
        let response = borrow(&client, &member, isbn).await;
        assert_eq!(response.status(), 201);
    }

    // One slot left; two simultaneous borrows of different books must
    // serialize on the user so only one succeeds
    let (a, b) = tokio::join!(
        borrow(&client, &member, &isbns[2]),
        borrow(&client, &member, &isbns[3])
    );
    let successes = [a.status(), b.status()]
        .iter()
        .filter(|s| s.as_u16() == 201)
        .count();
    assert_eq!(successes, 1);

    let open = client
        .get(format!("{}/users/borrowed-books", BASE_URL))
        .bearer_auth(&member)
        .send()
        .await
        .expect("Failed to send request");
    let open_body: Value = open.json().await.expect("Failed to parse response");
    assert_eq!(open_body.as_array().expect("Expected array").len(), 3);
}

#[tokio::test]
#[ignore]
async fn test_paying_pending_fine_completes_it() {
    let client = Client::new();
    let pool = test_pool().await;
    let (email, member) = register_verified(&client, &pool, "MEMBER").await;

    let profile: Value = client
        .get(format!("{}/users/profile", BASE_URL))
        .bearer_auth(&member)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let user_id = profile["id"].as_str().expect("No user id").to_string();

    sqlx::query("INSERT INTO transactions (user_id, amount, type, status) VALUES ($1::uuid, $2, 'FINE', 'PENDING')")
        .bind(&user_id)
        .bind(Decimal::new(300, 2))
        .execute(&pool)
        .await
        .expect("Failed to seed fine");

    let pending: Value = client
        .get(format!("{}/payment/fines/pending", BASE_URL))
        .bearer_auth(&member)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let fines = pending["fines"].as_array().expect("Expected array");
    assert_eq!(fines.len(), 1);
    assert_eq!(fines[0]["status"], "PENDING");
    assert_eq!(pending["total_amount"], "3.00");
    let fine_id = fines[0]["id"].as_str().expect("No fine id").to_string();

    let paid = client
        .post(format!("{}/payment/fines/pay", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({
            "fine_id": fine_id,
            "payment_method": "UPI"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(paid.status().is_success());

    let body: Value = paid.json().await.expect("Failed to parse response");
    assert_eq!(body["fine"]["id"], fine_id.as_str());
    assert_eq!(body["fine"]["status"], "COMPLETED");
    assert_eq!(body["payment"]["type"], "PAYMENT");
    assert_eq!(body["payment"]["status"], "COMPLETED");
    assert_eq!(body["payment"]["amount"], "3.00");
    assert!(body["invoice"]["invoice_number"]
        .as_str()
        .expect("No invoice number")
        .starts_with("INV-"));
    assert_eq!(body["invoice"]["user_details"]["email"], email.as_str());
    assert_eq!(body["invoice"]["status"], "PAID");

    // The fine no longer shows up as pending
    let after: Value = client
        .get(format!("{}/payment/fines/pending", BASE_URL))
        .bearer_auth(&member)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(after["fines"].as_array().expect("Expected array").is_empty());

    // Paying it again fails: only PENDING fines are payable
    let again = client
        .post(format!("{}/payment/fines/pay", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({
            "fine_id": fine_id,
            "payment_method": "UPI"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(again.status(), 404);
}
