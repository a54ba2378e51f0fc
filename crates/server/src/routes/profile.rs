//! The signed-in owner's profile.

use axum::{Form, Json, extract::State};

use crate::error::Result;
use crate::middleware::RequireSession;
use crate::models::Profile;
use crate::services::auth::AuthService;
use crate::state::AppState;
use crate::store::Store;
use crate::validation::ProfileForm;

pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(principal_id): RequireSession,
) -> Result<Json<Profile>> {
    let auth = AuthService::new(state.store(), state.vault(), state.tokens());
    Ok(Json(auth.profile(principal_id).await?))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(principal_id): RequireSession,
    Form(form): Form<ProfileForm>,
) -> Result<Json<Profile>> {
    let auth = AuthService::new(state.store(), state.vault(), state.tokens());
    Ok(Json(auth.update_profile(principal_id, form).await?))
}
