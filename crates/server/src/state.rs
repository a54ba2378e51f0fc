//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenService;
use crate::crypto::{FieldCipher, PasswordVault};
use crate::store::Store;

/// Application state shared across all handlers.
///
/// Cheap to clone: everything lives behind one `Arc`. The store backend is a
/// type parameter so the same routes serve `PgStore` in production and
/// `MemoryStore` in development and tests.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    cipher: FieldCipher,
    vault: PasswordVault,
    tokens: Arc<TokenService>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    #[must_use]
    pub fn new(store: S, cipher: FieldCipher, vault: PasswordVault, tokens: TokenService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                cipher,
                vault,
                tokens: Arc::new(tokens),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    #[must_use]
    pub fn cipher(&self) -> &FieldCipher {
        &self.inner.cipher
    }

    #[must_use]
    pub fn vault(&self) -> &PasswordVault {
        &self.inner.vault
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}

impl<S> FromRef<AppState<S>> for Arc<TokenService> {
    fn from_ref(state: &AppState<S>) -> Self {
        Arc::clone(&state.inner.tokens)
    }
}
