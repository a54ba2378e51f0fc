//! Registration, login and logout.

use axum::{
    Form, Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::{clear_session_cookie, session_cookie};
use crate::models::Profile;
use crate::services::auth::{AuthService, LoginForm};
use crate::state::AppState;
use crate::store::Store;
use crate::validation::RegistrationForm;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Create an owner account.
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    Form(form): Form<RegistrationForm>,
) -> Result<(StatusCode, Json<Profile>)> {
    let auth = AuthService::new(state.store(), state.vault(), state.tokens());
    let profile = auth.register(form).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Check credentials; return the token in the body and as a cookie.
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.store(), state.vault(), state.tokens());
    let issued = auth.login(form).await?;

    let cookie = session_cookie(&issued);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// Tokens are stateless; logging out only drops the client's cookie.
pub async fn logout() -> impl IntoResponse {
    ([(SET_COOKIE, clear_session_cookie())], StatusCode::NO_CONTENT)
}
