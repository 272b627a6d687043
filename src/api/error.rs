use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::headers::FAILURE_HEADER;
use crate::error::{FieldError, PersonError, ValidationError};

/// JSON body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ErrorBody {
    fn new(message: &str, description: impl Into<String>) -> Self {
        Self {
            message: message.to_string(),
            description: Some(description.into()),
            field_errors: Vec::new(),
        }
    }
}

/// Anything a handler can fail with, on its way to the client.
#[derive(Debug)]
pub enum ApiError {
    Person(PersonError),
    /// The body was not JSON or did not fit the payload shape.
    UnreadableBody(JsonRejection),
}

impl From<PersonError> for ApiError {
    fn from(error: PersonError) -> Self {
        Self::Person(error)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::Person(PersonError::Validation(error))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::UnreadableBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::Person(error) => error,
            Self::UnreadableBody(rejection) => {
                tracing::warn!("Unreadable request body: {}", rejection.body_text());
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::new("error.http.400", rejection.body_text())),
                )
                    .into_response();
            }
        };

        match error {
            PersonError::Validation(error) => {
                tracing::warn!("Validation error: {}", error);
                let body = ErrorBody {
                    message: "error.validation".to_string(),
                    description: None,
                    field_errors: error.field_errors,
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            PersonError::IdAlreadySet(id) => {
                tracing::warn!("Rejected create of person that already has id {}", id);
                let reason = "A new person cannot already have an ID";
                (
                    StatusCode::BAD_REQUEST,
                    [(FAILURE_HEADER, reason)],
                    Json(ErrorBody::new("error.idexists", reason)),
                )
                    .into_response()
            }
            PersonError::IdNotAssigned(id) => {
                tracing::warn!("Rejected update of person with unassigned id {}", id);
                let reason = "Entity not found";
                (
                    StatusCode::BAD_REQUEST,
                    [(FAILURE_HEADER, reason)],
                    Json(ErrorBody::new("error.idnotfound", reason)),
                )
                    .into_response()
            }
            PersonError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody::new(
                    "error.notfound",
                    format!("Person {} not found", id),
                )),
            )
                .into_response(),
            // Full detail stays in the server log.
            error @ (PersonError::Storage(_) | PersonError::Index(_)) => {
                tracing::error!("Internal error: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(
                        "error.internalServerError",
                        "Internal server error",
                    )),
                )
                    .into_response()
            }
        }
    }
}
