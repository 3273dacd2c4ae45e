//! Global settings endpoints.

use axum::Json;
use axum::extract::State;

use parentctl_app::ports::{ConfigStore, HostHintSource};
use parentctl_domain::settings::{Settings, SettingsDraft};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/settings`
pub async fn get<S, H>(State(state): State<AppState<S, H>>) -> Result<Json<Settings>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let settings = state.rule_form_service.get_settings().await?;
    Ok(Json(settings))
}

/// `PUT /api/settings`
pub async fn update<S, H>(
    State(state): State<AppState<S, H>>,
    Json(draft): Json<SettingsDraft>,
) -> Result<Json<Settings>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let settings = state.rule_form_service.update_settings(draft).await?;
    Ok(Json(settings))
}
