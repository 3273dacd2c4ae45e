//! Whole-form endpoints: the view a renderer draws and the batch submit.

use axum::Json;
use axum::extract::State;

use parentctl_app::ports::{ConfigStore, HostHintSource};
use parentctl_app::services::rule_form_service::{FormSubmission, FormView, SubmitOutcome};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/form`
pub async fn load<S, H>(State(state): State<AppState<S, H>>) -> Result<Json<FormView>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let view = state.rule_form_service.load_form().await?;
    Ok(Json(view))
}

/// `POST /api/form`
pub async fn submit<S, H>(
    State(state): State<AppState<S, H>>,
    Json(submission): Json<FormSubmission>,
) -> Result<Json<SubmitOutcome>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let outcome = state.rule_form_service.submit(submission).await?;
    Ok(Json(outcome))
}
