use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::error::ApiError;
use super::AppState;
use crate::models::*;
use crate::service::{Committed, Upsert};

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Persons
// ============================================================

pub async fn create_person(
    State(state): State<AppState>,
    payload: Result<Json<PersonPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    tracing::debug!("REST request to save Person : {:?}", payload);
    let record = payload.into_record()?;
    let committed = state.service.create(record).await?;
    Ok(created(&state, committed))
}

/// Records without an id take the create path and answer 201.
pub async fn update_person(
    State(state): State<AppState>,
    payload: Result<Json<PersonPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    tracing::debug!("REST request to update Person : {:?}", payload);
    let record = payload.into_record()?;
    let Committed { value, index_sync } = state.service.update(record).await?;

    Ok(match value {
        Upsert::Created(person) => created(
            &state,
            Committed {
                value: person,
                index_sync,
            },
        ),
        Upsert::Updated(person) => {
            let headers = state.alerts.entity_updated(person.id, &index_sync);
            (StatusCode::OK, headers, Json(person)).into_response()
        }
    })
}

pub async fn list_persons(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    tracing::debug!("REST request to get all Persons");
    Ok(Json(state.service.list()?))
}

pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Json<Person>, ApiError> {
    tracing::debug!("REST request to get Person : {}", id);
    Ok(Json(state.service.find(id)?))
}

pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
) -> Result<Response, ApiError> {
    tracing::debug!("REST request to delete Person : {}", id);
    let committed = state.service.delete(id).await?;
    let headers = state.alerts.entity_deleted(id, &committed.index_sync);
    Ok((StatusCode::OK, headers).into_response())
}

pub async fn search_persons(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<Person>>, ApiError> {
    tracing::debug!("REST request to search Persons for query : {}", query);
    Ok(Json(state.service.search(&query).await?))
}

fn created(state: &AppState, committed: Committed<Person>) -> Response {
    let person = committed.value;
    let location = format!("/api/persons/{}", person.id);
    let headers = state.alerts.entity_created(person.id, &committed.index_sync);

    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        headers,
        Json(person),
    )
        .into_response()
}
