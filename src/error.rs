//! Error types shared by the store, the index, and the service.

use serde::Serialize;
use thiserror::Error;

use crate::index::IndexError;
use crate::models::PersonId;

/// A single violated field constraint.
///
/// `message` is the constraint code (`NotNull`, `Size`, `Min`, `Max`) so that
/// clients can map it to their own wording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub object_name: String,
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(object_name: &str, field: &str, message: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// One or more field constraints were violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for {}", describe(.field_errors))]
pub struct ValidationError {
    pub field_errors: Vec<FieldError>,
}

impl ValidationError {
    /// `Ok(())` when nothing was collected.
    pub fn from_field_errors(field_errors: Vec<FieldError>) -> Result<(), Self> {
        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(Self { field_errors })
        }
    }
}

fn describe(field_errors: &[FieldError]) -> String {
    field_errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by person operations.
#[derive(Debug, Error)]
pub enum PersonError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A new person cannot already have an ID (got {0})")]
    IdAlreadySet(PersonId),

    #[error("Person {0} not found")]
    NotFound(PersonId),

    #[error("Person id {0} was never assigned by the store")]
    IdNotAssigned(PersonId),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("search index failure: {0}")]
    Index(#[from] IndexError),
}
