//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use parentctl_domain::error::{ParentalControlError, RowErrors, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [ValidationError]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<&'a [RowErrors]>,
}

impl ErrorBody<'_> {
    fn message(error: String) -> Self {
        Self {
            error,
            fields: None,
            rows: None,
        }
    }
}

/// Maps [`ParentalControlError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(ParentalControlError);

impl From<ParentalControlError> for ApiError {
    fn from(err: ParentalControlError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let (status, body) = match &self.0 {
            ParentalControlError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    fields: Some(errors.errors()),
                    ..ErrorBody::message(message)
                },
            ),
            ParentalControlError::InvalidSubmission(rows) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    rows: Some(rows.as_slice()),
                    ..ErrorBody::message(message)
                },
            ),
            ParentalControlError::NotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorBody::message(message))
            }
            ParentalControlError::Storage(err) | ParentalControlError::HostHints(err) => {
                tracing::error!(error = %err, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("internal server error".to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
