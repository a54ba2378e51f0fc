//! Customer CRUD and search. Every handler is scoped to the session's owner.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use glamdesk_core::CustomerId;

use crate::error::Result;
use crate::middleware::RequireSession;
use crate::models::Customer;
use crate::services::customers::CustomerDirectory;
use crate::state::AppState;
use crate::store::Store;
use crate::validation::CustomerForm;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
) -> Result<Json<Vec<Customer>>> {
    let directory = CustomerDirectory::new(state.store(), state.cipher());
    Ok(Json(directory.list(owner).await?))
}

pub async fn search<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>> {
    let directory = CustomerDirectory::new(state.store(), state.cipher());
    Ok(Json(directory.search(owner, &query.q).await?))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
    Json(form): Json<CustomerForm>,
) -> Result<(StatusCode, Json<Customer>)> {
    let directory = CustomerDirectory::new(state.store(), state.cipher());
    let customer = directory.create(owner, form).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
    Path(id): Path<CustomerId>,
) -> Result<Json<Customer>> {
    let directory = CustomerDirectory::new(state.store(), state.cipher());
    Ok(Json(directory.get(owner, id).await?))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
    Path(id): Path<CustomerId>,
    Json(form): Json<CustomerForm>,
) -> Result<Json<Customer>> {
    let directory = CustomerDirectory::new(state.store(), state.cipher());
    Ok(Json(directory.update(owner, id, form).await?))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode> {
    let directory = CustomerDirectory::new(state.store(), state.cipher());
    directory.delete(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
