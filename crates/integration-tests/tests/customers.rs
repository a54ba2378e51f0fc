//! Owner-scoped customer management over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use glamdesk_core::{EncryptedField, PrincipalId};
use glamdesk_integration_tests::TestApp;
use glamdesk_server::models::NewCustomer;
use glamdesk_server::services::customers::DECRYPTION_FAILED;
use glamdesk_server::store::{CustomerStore, PrincipalStore};

async fn create(app: &TestApp, token: &str, body: &Value) -> Value {
    let response = app
        .send_json(Method::POST, "/api/customers", body, Some(token))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

fn alice() -> Value {
    json!({
        "name": "Alice Moreau",
        "phone": "+1 (415) 555-0100",
        "email": "alice@example.test",
        "birthday": "1990-06-15",
        "anniversary": "2015-09-01",
    })
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_create_and_show_decrypts_for_owner() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;

    let created = create(&app, &token, &alice()).await;
    assert_eq!(created["phone"], "+1 (415) 555-0100");

    let id = created["id"].as_i64().unwrap();
    let shown = app.get(&format!("/api/customers/{id}"), Some(&token)).await;

    assert_eq!(shown.status, StatusCode::OK);
    assert_eq!(shown.body["name"], "Alice Moreau");
    assert_eq!(shown.body["phone"], "+1 (415) 555-0100");
    assert_eq!(shown.body["email"], "alice@example.test");
    assert_eq!(shown.body["birthday"], "1990-06-15");
}

#[tokio::test]
async fn test_pii_is_stored_encrypted() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    let created = create(&app, &token, &alice()).await;

    let owner = PrincipalId::new(1);
    let id = created["id"].as_i64().unwrap().to_string().parse().unwrap();
    let record = app.store.get_customer(owner, id).await.unwrap();

    assert_ne!(record.phone.as_bytes(), b"+1 (415) 555-0100");
    assert_eq!(app.cipher.decrypt(&record.phone).unwrap(), "+1 (415) 555-0100");
    assert_eq!(app.cipher.decrypt(&record.email).unwrap(), "alice@example.test");
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    let id = create(&app, &token, &alice()).await["id"].as_i64().unwrap();
    let uri = format!("/api/customers/{id}");

    let updated = app
        .send_json(
            Method::PUT,
            &uri,
            &json!({ "name": "Alice Martin", "phone": "555 0199" }),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);
    assert_eq!(updated.body["name"], "Alice Martin");
    assert_eq!(updated.body["email"], "");
    assert_eq!(updated.body["birthday"], Value::Null);

    let deleted = app.delete(&uri, Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.get(&uri, Some(&token)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_fields_are_rejected() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;

    for body in [
        json!({ "name": "   " }),
        json!({ "name": "Bob", "phone": "call me" }),
        json!({ "name": "Bob", "email": "not-an-email" }),
        json!({ "name": "Bob", "birthday": "15/06/1990" }),
    ] {
        let response = app
            .send_json(Method::POST, "/api/customers", &body, Some(&token))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
    }

    let listed = app.get("/api/customers", Some(&token)).await;
    assert_eq!(listed.body, json!([]));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_list_is_ordered_and_search_is_case_insensitive() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    for name in ["Zoe Park", "alice Moreau", "Malik Alvarez"] {
        create(&app, &token, &json!({ "name": name })).await;
    }

    let listed = app.get("/api/customers", Some(&token)).await;
    let names: Vec<&str> = listed
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice Moreau", "Malik Alvarez", "Zoe Park"]);

    let found = app.get("/api/customers/search?q=AL", Some(&token)).await;
    assert_eq!(found.body.as_array().unwrap().len(), 2);

    let blank = app.get("/api/customers/search?q=", Some(&token)).await;
    assert_eq!(blank.body.as_array().unwrap().len(), 3);

    let none = app.get("/api/customers/search?q=%25", Some(&token)).await;
    assert_eq!(none.body, json!([]));
}

// ============================================================================
// Tenant isolation
// ============================================================================

#[tokio::test]
async fn test_owners_cannot_see_each_others_customers() {
    let app = TestApp::new();
    let first = app.owner_token("first@shear.test", "Shear Bliss").await;
    let second = app.owner_token("second@glow.test", "Glow Studio").await;

    let id = create(&app, &first, &alice()).await["id"].as_i64().unwrap();
    let uri = format!("/api/customers/{id}");

    assert_eq!(
        app.get(&uri, Some(&second)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.send_json(Method::PUT, &uri, &json!({ "name": "Mallory" }), Some(&second))
            .await
            .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.delete(&uri, Some(&second)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/api/customers/search?q=alice", Some(&second))
            .await
            .body,
        json!([])
    );

    let still_there = app.get(&uri, Some(&first)).await;
    assert_eq!(still_there.body["name"], "Alice Moreau");
}

// ============================================================================
// Decrypt policies
// ============================================================================

#[tokio::test]
async fn test_corrupt_field_degrades_list_but_fails_show() {
    let app = TestApp::new();
    let token = app.owner_token("owner@shear.test", "Shear Bliss").await;
    create(&app, &token, &alice()).await;

    let owner = app
        .store
        .find_principal_by_email(&"owner@shear.test".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    let corrupt = app
        .store
        .insert_customer(
            owner.id,
            NewCustomer {
                name: "Broken Record".to_string(),
                phone: EncryptedField::from_bytes(vec![7; 40]),
                email: app.cipher.encrypt("broken@example.test").unwrap(),
                birthday: None,
                anniversary: None,
            },
        )
        .await
        .unwrap();

    let listed = app.get("/api/customers", Some(&token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    let broken = listed
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Broken Record")
        .unwrap();
    assert_eq!(broken["phone"], DECRYPTION_FAILED);
    assert_eq!(broken["email"], "broken@example.test");

    let shown = app
        .get(&format!("/api/customers/{}", corrupt.id), Some(&token))
        .await;
    assert_eq!(shown.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(shown.body["error"], DECRYPTION_FAILED);
}
