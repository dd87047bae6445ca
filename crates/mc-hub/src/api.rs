//! # API Handlers
//!
//! Axum handlers for the directory: the `/data` query endpoint, people CRUD
//! and achievements CRUD.

use crate::error::ApiError;
use crate::validation::{validate_person, CREATE_REQUIRED, EDIT_REQUIRED};
use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use mc_core::{InvalidKey, Record, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Request Bodies
// =============================================================================

/// A record posted either as JSON or as an HTML form.
pub struct Payload(pub Record);

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Ok(Payload(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ));
        }

        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Record::try_from(value)
            .map(Payload)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

// =============================================================================
// Query
// =============================================================================

/// Error shape the front end expects for an unknown filter key.
#[derive(Debug, Serialize, PartialEq)]
pub struct InvalidKeyPayload {
    #[serde(rename = "errorCode")]
    pub error_code: &'static str,
    pub message: String,
}

impl From<&InvalidKey> for InvalidKeyPayload {
    fn from(err: &InvalidKey) -> Self {
        Self {
            error_code: "404",
            message: format!("\"{}\"", err),
        }
    }
}

pub async fn query_people(
    State(state): State<Arc<AppState>>,
    param: Option<Path<String>>,
) -> Result<Response, ApiError> {
    let segment = param.map(|Path(p)| p).unwrap_or_default();
    let records = state.people.fetch_all().await?;
    let outcome = state.engine.run(&records, &segment);

    // Only a key that no record carries is an error; optional fields stay filterable.
    let (unknown, partial): (Vec<&InvalidKey>, Vec<&InvalidKey>) = outcome
        .invalid_keys
        .iter()
        .partition(|err| err.records == records.len());

    for err in &partial {
        tracing::debug!(
            "Query '{}': '{}' missing on {} of {} record(s)",
            segment,
            err.key,
            err.records,
            records.len()
        );
    }

    if !unknown.is_empty() {
        for err in &unknown {
            tracing::warn!("Query '{}': {}", segment, err);
        }
        let payloads: Vec<InvalidKeyPayload> =
            unknown.into_iter().map(InvalidKeyPayload::from).collect();
        return Ok((StatusCode::NOT_FOUND, Json(payloads)).into_response());
    }

    tracing::debug!(
        "Query '{}' selected {} of {} record(s)",
        segment,
        outcome.selection.len(),
        records.len()
    );
    Ok(Json(&outcome.selection).into_response())
}

// =============================================================================
// People
// =============================================================================

/// People whose email local part equals `handle`.
pub async fn user_by_handle(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let people = state.people.fetch_all().await?;
    let matched = people
        .into_iter()
        .filter(|person| {
            person
                .text("email")
                .is_some_and(|email| local_part(&email) == handle)
        })
        .collect();
    Ok(Json(matched))
}

fn local_part(email: &str) -> &str {
    email.find('@').map_or("", |at| &email[..at])
}

pub async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let people = state.people.fetch_all().await?;
    people
        .into_iter()
        .find(|person| person.text("_id").is_some_and(|v| v == id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("member '{}'", id)))
}

pub async fn create_person(
    State(state): State<Arc<AppState>>,
    Payload(record): Payload,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    validate_person(&record, CREATE_REQUIRED).map_err(|errors| {
        tracing::warn!("Rejected new member: {}", errors.join(", "));
        ApiError::Validation(errors)
    })?;
    let stored = state.people.insert(record).await?;
    tracing::info!("Created member {:?}", stored.text("_id"));
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn edit_person(
    State(state): State<Arc<AppState>>,
    Payload(record): Payload,
) -> Result<Json<Record>, ApiError> {
    validate_person(&record, EDIT_REQUIRED).map_err(|errors| {
        tracing::warn!("Rejected member edit: {}", errors.join(", "));
        ApiError::Validation(errors)
    })?;
    let id = required_text(&record, "_id")?;
    let updated = state.people.update("_id", &id, record).await?;
    Ok(Json(updated))
}

pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    Payload(record): Payload,
) -> Result<StatusCode, ApiError> {
    let id = required_text(&record, "_id")?;
    state
        .people
        .delete_where(&[("_id".to_string(), id.clone())])
        .await?;
    tracing::info!("Deleted member {}", id);
    Ok(StatusCode::NO_CONTENT)
}

fn required_text(record: &Record, field: &str) -> Result<String, ApiError> {
    record
        .text(field)
        .map(|t| t.into_owned())
        .ok_or_else(|| ApiError::Validation(vec![format!("{} is required", field)]))
}

// =============================================================================
// Achievements
// =============================================================================

pub async fn list_achievements(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.achievements.fetch_all().await?))
}

pub async fn create_achievement(
    State(state): State<Arc<AppState>>,
    Payload(record): Payload,
) -> Result<&'static str, ApiError> {
    state.achievements.insert(record).await?;
    Ok("success")
}

pub async fn edit_achievement(
    State(state): State<Arc<AppState>>,
    Payload(record): Payload,
) -> Result<&'static str, ApiError> {
    let id = required_text(&record, "id")?;
    state.achievements.update("id", &id, record).await?;
    Ok("success")
}

pub async fn delete_achievement(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<&'static str, ApiError> {
    if params.is_empty() {
        return Err(ApiError::Validation(vec![
            "at least one field to match is required".into(),
        ]));
    }
    let criteria: Vec<(String, String)> = params.into_iter().collect();
    state.achievements.delete_where(&criteria).await?;
    Ok("success")
}
