//! API integration tests
//!
//! Run against a live server with a fresh database and a bootstrapped admin:
//! `LIBRARY_AUTH__ADMIN_USERNAME=admin LIBRARY_AUTH__ADMIN_PASSWORD=admin-password cargo run`
//! then `cargo test --test api_tests -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Suffix keeping usernames and author names unique across runs
fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "admin-password").await
}

/// Create a patron and return (id, token)
async fn create_patron(client: &Client) -> (i64, String) {
    let username = unique("patron");
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "username": username,
            "email": "patron@example.org",
            "first_name": "Pat",
            "last_name": "Ron",
            "password": "patron-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_i64().expect("No user ID");
    assert_eq!(body["is_librarian"], false);

    (id, login(client, &username, "patron-password").await)
}

/// Create a book with a fresh author and return (author_id, book_id)
async fn create_book(client: &Client, token: &str) -> (i64, i64) {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "book_name": "Test Book",
            "description": "A book used in tests",
            "author": unique("author"),
            "publication_year": 1999
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    (body["author_id"].as_i64().unwrap(), body["id"].as_i64().unwrap())
}

async fn create_borrow(client: &Client, token: &str, book_id: i64) -> Value {
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn set_status(client: &Client, token: &str, borrow_id: i64, status: &str) -> reqwest::Response {
    client
        .put(format!("{}/borrows/{}/status", BASE_URL, borrow_id))
        .bearer_auth(token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to send request")
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
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_username_is_conflict() {
    let client = Client::new();
    let username = unique("dup");
    let payload = json!({
        "username": username,
        "email": "dup@example.org",
        "first_name": "Dup",
        "last_name": "Licate"
    });

    let first = client
        .post(format!("{}/users", BASE_URL))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{}/users", BASE_URL))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let token = admin_token(&client).await;
    let users: Value = client
        .get(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let matching = users
        .as_array()
        .unwrap()
        .iter()
        .filter(|u| u["username"] == username.as_str())
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
#[ignore]
async fn test_borrow_workflow() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, patron) = create_patron(&client).await;
    let (_, book_id) = create_book(&client, &admin).await;

    let borrow = create_borrow(&client, &patron, book_id).await;
    assert_eq!(borrow["status"], "pending");
    assert!(borrow["return_date"].is_null());
    let borrow_id = borrow["id"].as_i64().unwrap();

    // Invalid status leaves the record untouched
    let response = set_status(&client, &admin, borrow_id, "pending").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let current: Value = client
        .get(format!("{}/borrows/{}", BASE_URL, borrow_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["status"], "pending");

    let response = set_status(&client, &admin, borrow_id, "approved").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["borrow"]["status"], "approved");
    assert_eq!(body["borrow"]["borrow_date"], borrow["borrow_date"]);

    // Terminal state
    let response = set_status(&client, &admin, borrow_id, "denied").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let returned: Value = response.json().await.unwrap();
    assert!(returned["return_date"].is_string());
    assert_eq!(returned["status"], "approved");
}

#[tokio::test]
#[ignore]
async fn test_resolve_missing_borrow_is_not_found() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let response = set_status(&client, &admin, i32::MAX as i64, "approved").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_user_borrows_are_scoped_to_user() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user_a, token_a) = create_patron(&client).await;
    let (user_b, token_b) = create_patron(&client).await;
    let (_, book_id) = create_book(&client, &admin).await;

    create_borrow(&client, &token_a, book_id).await;
    let borrow_b = create_borrow(&client, &token_b, book_id).await;

    let borrows: Value = client
        .get(format!("{}/users/{}/borrows", BASE_URL, user_b))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let borrows = borrows.as_array().unwrap();
    assert_eq!(borrows.len(), 1);
    assert_eq!(borrows[0]["id"], borrow_b["id"]);
    assert_eq!(borrows[0]["user_id"].as_i64(), Some(user_b));
    assert_ne!(borrows[0]["user_id"].as_i64(), Some(user_a));
}

#[tokio::test]
#[ignore]
async fn test_delete_author_cascades() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (_, patron) = create_patron(&client).await;
    let (author_id, book_id) = create_book(&client, &admin).await;
    let borrow = create_borrow(&client, &patron, book_id).await;

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let book = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap();
    assert_eq!(book.status(), StatusCode::NOT_FOUND);

    let borrow = client
        .get(format!("{}/borrows/{}", BASE_URL, borrow["id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(borrow.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_create_book_for_missing_author() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let before: Value = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/authors/{}/books", BASE_URL, i32::MAX))
        .bearer_auth(&admin)
        .json(&json!({ "book_name": "Orphan", "description": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let after: Value = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before.as_array().unwrap().len(), after.as_array().unwrap().len());
}

#[tokio::test]
#[ignore]
async fn test_create_book_with_existing_author_name_is_conflict() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let author = unique("author");
    let payload = json!({ "book_name": "First", "author": author, "publication_year": 1850 });

    let first = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "book_name": "Second", "author": author }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}
