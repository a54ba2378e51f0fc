//! Integration tests for Glamdesk.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process HTTP and scheduler tests (no external services)
//! cargo test -p glamdesk-integration-tests
//!
//! # PostgreSQL store tests
//! GLAMDESK_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p glamdesk-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - registration, login, session extraction
//! - `customers` - owner-scoped CRUD and decrypt policies over HTTP
//! - `reminders` - templates saved over HTTP driving a scheduler pass
//! - `postgres_store` - the sqlx backend against a real database

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use glamdesk_server::auth::TokenService;
use glamdesk_server::crypto::{EncryptionKey, FieldCipher, PasswordVault};
use glamdesk_server::state::AppState;
use glamdesk_server::store::MemoryStore;

pub const TOKEN_SECRET: &str = "k7Qp2vX9mZ4rT8wY1bN6cF3hJ5dL0sAe";
pub const PASSWORD: &str = "Abc12345!";

/// A response reduced to what the tests look at.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The full router over an in-memory store, plus handles to its parts.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub cipher: FieldCipher,
    pub tokens: TokenService,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tokens(TokenService::new(Some(SecretString::from(TOKEN_SECRET))))
    }

    #[must_use]
    pub fn with_tokens(tokens: TokenService) -> Self {
        let store = MemoryStore::new();
        let cipher = FieldCipher::new(&EncryptionKey::from_bytes([42u8; 32]));
        // Low-cost parameters; production uses the Argon2 defaults.
        let vault = argon2::Params::new(256, 1, 1, None)
            .map_or_else(|_| PasswordVault::new(), PasswordVault::with_params);
        let state = AppState::new(store.clone(), cipher.clone(), vault, tokens.clone());

        Self {
            router: glamdesk_server::app(state),
            store,
            cipher,
            tokens,
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, Body::empty(), None))
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, Body::empty(), None))
            .await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        token: Option<&str>,
    ) -> TestResponse {
        self.send(request(
            Method::POST,
            uri,
            token,
            Body::from(encode_form(fields)),
            Some("application/x-www-form-urlencoded"),
        ))
        .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: &Value,
        token: Option<&str>,
    ) -> TestResponse {
        self.send(request(
            method,
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ))
        .await
    }

    /// Register an owner with a valid profile.
    pub async fn register(&self, email: &str, salon_name: &str) -> TestResponse {
        self.post_form(
            "/api/register",
            &[
                ("name", "Maya Lopez"),
                ("salon_name", salon_name),
                ("phone", "+14155550123"),
                ("address", "12 Market Street, Springfield"),
                ("email", email),
                ("password", PASSWORD),
            ],
            None,
        )
        .await
    }

    /// Register an owner and return a session token for it.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn owner_token(&self, email: &str, salon_name: &str) -> String {
        let registered = self.register(email, salon_name).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);

        let login = self
            .post_form("/api/login", &[("email", email), ("password", PASSWORD)], None)
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        login.body["token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("valid request")
}

/// `application/x-www-form-urlencoded` encoding.
#[must_use]
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_form() {
        assert_eq!(
            encode_form(&[("email", "a+b@x.test"), ("name", "Ana María")]),
            "email=a%2Bb%40x.test&name=Ana%20Mar%C3%ADa"
        );
    }
}
