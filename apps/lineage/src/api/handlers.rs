//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads take the store's read lock; create and delete take the write lock.

use super::{
    AppState,
    types::{
        CountResponse, CreatePersonRequest, DeleteResponse, ErrorResponse, ExportResponse,
        FamilyResponse, GenerationsResponse, HealthResponse, PersonJson, PersonQuery,
        PersonResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lineage_core::{Gender, LineageError, PersonId, PersonStore, formats::snapshot_to_bytes};

/// Map a core error to the client-visible status code.
fn status_for(error: &LineageError) -> StatusCode {
    match error {
        LineageError::NotFound(_) => StatusCode::NOT_FOUND,
        LineageError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LineageError::IdSpaceExhausted(_) => StatusCode::INSUFFICIENT_STORAGE,
        LineageError::SerializationError(_)
        | LineageError::DeserializationError(_)
        | LineageError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an error for endpoints whose success body has no error slot.
fn error_response(error: &LineageError) -> Response {
    let status = status_for(error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Storage failure: {}", error);
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get registry status.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let store = state.store.read().await;
    match store.len() {
        Ok(person_count) => Json(StatusResponse {
            person_count,
            next_id: store.next_id(),
            backend: store.kind().to_string(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// PERSON CRUD HANDLERS
// =============================================================================

/// Create a person.
pub async fn create_person_handler(
    State(state): State<AppState>,
    Json(request): Json<CreatePersonRequest>,
) -> impl IntoResponse {
    let draft = match request.to_draft() {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PersonResponse::error(e.to_string())),
            );
        }
    };

    let mut store = state.store.write().await;
    match store.insert(draft) {
        Ok(person) => {
            tracing::info!(person = person.id.0, "Created person");
            (StatusCode::OK, Json(PersonResponse::success(&person)))
        }
        Err(e) => (status_for(&e), Json(PersonResponse::error(e.to_string()))),
    }
}

/// List every person in ascending id order.
pub async fn list_persons_handler(State(state): State<AppState>) -> Response {
    let store = state.store.read().await;
    match store.list_all() {
        Ok(persons) => {
            let body: Vec<PersonJson> = persons.iter().map(PersonJson::from).collect();
            Json(body).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Fetch one person.
pub async fn get_person_handler(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
) -> impl IntoResponse {
    let id = PersonId(person_id);
    let store = state.store.read().await;
    let result = store
        .get_by_id(id)
        .and_then(|p| p.ok_or(LineageError::NotFound(id)));
    match result {
        Ok(person) => (StatusCode::OK, Json(PersonResponse::success(&person))),
        Err(e) => (status_for(&e), Json(PersonResponse::error(e.to_string()))),
    }
}

/// Delete a person. Children keep their (now dangling) parent reference.
pub async fn delete_person_handler(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match store.delete_by_id(PersonId(person_id)) {
        Ok(_) => {
            tracing::info!(person = person_id, "Deleted person");
            (StatusCode::OK, Json(DeleteResponse::success()))
        }
        Err(e) => (status_for(&e), Json(DeleteResponse::error(e.to_string()))),
    }
}

// =============================================================================
// RELATIONSHIP HANDLERS
// =============================================================================

/// Immediate family (self, parents, children) with gender totals.
pub async fn family_handler(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
) -> Response {
    let id = PersonId(person_id);
    let store = state.store.read().await;
    match store.family().immediate_family(id) {
        Ok(members) => Json(FamilyResponse::new(id, &members)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Number of records that are the person or name them as a parent.
pub async fn family_size_handler(
    State(state): State<AppState>,
    Query(query): Query<PersonQuery>,
) -> Response {
    let store = state.store.read().await;
    match store.family().family_size(PersonId(query.person_id)) {
        Ok(count) => Json(CountResponse {
            person_id: query.person_id,
            count,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Paternal-line generation count; 404 if the person does not exist.
pub async fn generations_handler(
    State(state): State<AppState>,
    Query(query): Query<PersonQuery>,
) -> Response {
    let store = state.store.read().await;
    match store.family().generation_depth(PersonId(query.person_id)) {
        Ok(generations) => Json(GenerationsResponse {
            person_id: query.person_id,
            generations,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn gender_count(state: AppState, person_id: i64, gender: Gender) -> Response {
    let store = state.store.read().await;
    match store.family().count_by_gender(PersonId(person_id), &gender) {
        Ok(count) => Json(CountResponse { person_id, count }).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Number of males in the immediate family.
pub async fn male_count_handler(
    State(state): State<AppState>,
    Query(query): Query<PersonQuery>,
) -> Response {
    gender_count(state, query.person_id, Gender::Male).await
}

/// Number of females in the immediate family.
pub async fn female_count_handler(
    State(state): State<AppState>,
    Query(query): Query<PersonQuery>,
) -> Response {
    gender_count(state, query.person_id, Gender::Female).await
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export every record as a base64 binary snapshot (works with both backends).
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;

    let snapshot = match store.snapshot() {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExportResponse::error(format!(
                    "Failed to build snapshot: {}",
                    e
                ))),
            );
        }
    };

    match snapshot_to_bytes(&snapshot) {
        Ok(data) => (
            StatusCode::OK,
            Json(ExportResponse::success(&data, snapshot.persons.len())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
