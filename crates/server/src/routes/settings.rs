//! Reminder template settings.

use axum::{Form, Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use glamdesk_core::EventType;

use crate::error::Result;
use crate::middleware::RequireSession;
use crate::models::ReminderTemplate;
use crate::reminders::DEFAULT_TEMPLATE;
use crate::state::AppState;
use crate::store::{Store, TemplateStore};
use crate::validation::{ValidationError, validate_template};

#[derive(Debug, Serialize)]
pub struct ReminderSettingsResponse {
    /// Used for any event type without a saved template.
    pub default_template: &'static str,
    pub templates: Vec<ReminderTemplate>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateForm {
    #[serde(default, alias = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub template: String,
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
) -> Result<Json<ReminderSettingsResponse>> {
    let templates = state.store().list_templates(owner).await?;
    Ok(Json(ReminderSettingsResponse {
        default_template: DEFAULT_TEMPLATE,
        templates,
    }))
}

/// Insert or replace the template for one event type.
pub async fn save<S: Store>(
    State(state): State<AppState<S>>,
    RequireSession(owner): RequireSession,
    Form(form): Form<TemplateForm>,
) -> Result<Json<ReminderTemplate>> {
    let event_type = form
        .event_type
        .parse::<EventType>()
        .map_err(|_| ValidationError::EventType(form.event_type.clone()))?;
    let template = validate_template(&form.template)?;

    let saved = state
        .store()
        .upsert_template(owner, event_type, template)
        .await?;
    info!(owner_id = %owner, %event_type, "Reminder template saved");
    Ok(Json(saved))
}
