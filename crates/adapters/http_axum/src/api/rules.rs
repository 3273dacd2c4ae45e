//! JSON REST handlers for rules.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use parentctl_app::ports::{ConfigStore, HostHintSource};
use parentctl_domain::error::{NotFoundError, ParentalControlError};
use parentctl_domain::id::RuleId;
use parentctl_domain::rule::{Rule, RuleDraft};

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Rule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// An id that does not parse cannot name a stored rule.
fn parse_id(id: &str) -> Result<RuleId, ApiError> {
    RuleId::from_str(id).map_err(|_| {
        ApiError::from(ParentalControlError::from(NotFoundError {
            entity: "Rule",
            id: id.to_string(),
        }))
    })
}

/// `GET /api/rules`
pub async fn list<S, H>(State(state): State<AppState<S, H>>) -> Result<Json<Vec<Rule>>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let rules = state.rule_form_service.list_rules().await?;
    Ok(Json(rules))
}

/// `GET /api/rules/{id}`
pub async fn get<S, H>(
    State(state): State<AppState<S, H>>,
    Path(id): Path<String>,
) -> Result<Json<Rule>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let rule = state.rule_form_service.get_rule(parse_id(&id)?).await?;
    Ok(Json(rule))
}

/// `POST /api/rules`
pub async fn create<S, H>(
    State(state): State<AppState<S, H>>,
    Json(draft): Json<RuleDraft>,
) -> Result<CreateResponse, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let rule = state.rule_form_service.create_rule(draft).await?;
    Ok(CreateResponse::Created(Json(rule)))
}

/// `PUT /api/rules/{id}`
pub async fn update<S, H>(
    State(state): State<AppState<S, H>>,
    Path(id): Path<String>,
    Json(draft): Json<RuleDraft>,
) -> Result<Json<Rule>, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    let rule = state
        .rule_form_service
        .update_rule(parse_id(&id)?, draft)
        .await?;
    Ok(Json(rule))
}

/// `DELETE /api/rules/{id}`
pub async fn delete<S, H>(
    State(state): State<AppState<S, H>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    state.rule_form_service.delete_rule(parse_id(&id)?).await?;
    Ok(DeleteResponse::NoContent)
}
