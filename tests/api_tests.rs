//! API integration tests. They expect a running server with a fresh
//! database seeded with members 1 (active) and 2 (suspended) and authors
//! 1-3 / category 1, e.g. via scripts/seed.sql.
//!
//! Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn create_book(client: &Client, title: &str, copies: i32, authors: Vec<i32>) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": title,
            "total_copies": copies,
            "author_ids": authors,
            "category_ids": [1]
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse book response")
}

async fn borrow(client: &Client, book_id: i64, member_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "book_id": book_id, "member_id": member_id }))
        .send()
        .await
        .expect("Failed to send borrow request")
}

#[tokio::test]
#[ignore]
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

    // Readiness round-trips the pool, so it only passes with Postgres up
    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_cycle() {
    let client = Client::new();
    let book = create_book(&client, "Borrow cycle", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();
    assert_eq!(book["available_copies"], 1);

    // Borrow: status borrowed, copy off the shelf
    let response = borrow(&client, book_id, 1).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "borrowed");
    let loan_id = loan["id"].as_i64().unwrap();

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["available_copies"], 0);

    // Second borrow fails with no available copies, nothing changes
    let response = borrow(&client, book_id, 1).await;
    assert_eq!(response.status(), 409);

    // Return: status returned, copy back on the shelf
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "returned");
    assert!(loan["return_date"].is_string());

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["available_copies"], 1);

    // Returning again is a rejection, not a no-op
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_suspended_member_cannot_borrow() {
    let client = Client::new();
    let book = create_book(&client, "Suspended member", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = borrow(&client, book_id, 2).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_sweep_and_fines() {
    let client = Client::new();
    let book = create_book(&client, "Overdue fines", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    // Loan due 2024-01-10
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "book_id": book_id,
            "member_id": 1,
            "borrow_date": "2024-01-01",
            "due_date": "2024-01-10"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.unwrap();
    let loan_id = loan["id"].as_i64().unwrap();

    // Sweep as of 2024-01-15 promotes it to overdue
    let response = client
        .post(format!("{}/admin/sweep-overdue", BASE_URL))
        .json(&json!({ "as_of_date": "2024-01-15" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let loan: Value = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loan["status"], "overdue");

    // Five days late at 1.0/day -> 5.0; the batch is idempotent
    for _ in 0..2 {
        let response = client
            .post(format!("{}/admin/calculate-fines", BASE_URL))
            .json(&json!({ "fine_per_day": 1.0, "as_of_date": "2024-01-15" }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        let loan: Value = client
            .get(format!("{}/loans/{}", BASE_URL, loan_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        // NUMERIC(10,2) round-trips through Decimal as a 2-scale string
        assert_eq!(loan["fine_amount"], "5.00");
    }

    // Extension past the reference date drops it back to borrowed
    let response = client
        .post(format!("{}/loans/{}/extend", BASE_URL, loan_id))
        .json(&json!({ "due_date": "2024-02-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "borrowed");
}

#[tokio::test]
#[ignore]
async fn test_replace_authors_wholesale() {
    let client = Client::new();
    let book = create_book(&client, "Author replacement", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .json(&json!({ "author_ids": [2, 3] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let book: Value = response.json().await.unwrap();

    let ids: Vec<i64> = book["authors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
#[ignore]
async fn test_unknown_author_rolls_back_update() {
    let client = Client::new();
    let book = create_book(&client, "Rollback", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .json(&json!({ "title": "Should not stick", "author_ids": [99999] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // The unrelated field change rolled back with the link failure
    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["title"], "Rollback");
}

#[tokio::test]
#[ignore]
async fn test_total_copies_edit_reconciles_available() {
    let client = Client::new();
    let book = create_book(&client, "Copy reconciliation", 2, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = borrow(&client, book_id, 1).await;
    assert_eq!(response.status(), 201);

    // Growing the stock grows the shelf by the same delta
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .json(&json!({ "total_copies": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let book: Value = response.json().await.unwrap();
    assert_eq!(book["total_copies"], 5);
    assert_eq!(book["available_copies"], 4);

    // Shrinking below the borrowed count clamps the shelf at zero
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .json(&json!({ "total_copies": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let book: Value = response.json().await.unwrap();
    assert_eq!(book["total_copies"], 1);
    assert_eq!(book["available_copies"], 0);
}

#[tokio::test]
#[ignore]
async fn test_mark_lost_retires_copy() {
    let client = Client::new();
    let book = create_book(&client, "Lost copy", 2, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = borrow(&client, book_id, 1).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.unwrap();
    let loan_id = loan["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/loans/{}/lost", BASE_URL, loan_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "lost");

    // The lost copy leaves the stock; the shelf count is untouched
    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["total_copies"], 1);
    assert_eq!(book["available_copies"], 1);

    // A lost loan is terminal
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_delete_blocked_by_active_loan() {
    let client = Client::new();
    let book = create_book(&client, "Delete guard", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = borrow(&client, book_id, 1).await;
    assert_eq!(response.status(), 201);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Book unchanged
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_take_one_copy() {
    let client = Client::new();
    let book = create_book(&client, "Last copy race", 1, vec![1]).await;
    let book_id = book["id"].as_i64().unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            borrow(&client, book_id, 1).await.status().as_u16()
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            201 => created += 1,
            409 => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
}
