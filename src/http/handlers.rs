//! Note endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::notes::{NoteContent, NoteFilter, NotePage, NoteSummary};
use crate::security::Principal;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub appointment_id: String,
    #[serde(flatten)]
    pub content: NoteContent,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(flatten)]
    pub content: NoteContent,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub therapist_id: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub note: NoteSummary,
    pub content: NoteContent,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteSummary>), ApiError> {
    let plaintext = seal_input(&body.content)?;
    let summary = state
        .notes
        .create_note(Some(&principal), &body.appointment_id, &plaintext)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Result<Json<NotePage>, ApiError> {
    let filter = NoteFilter {
        therapist_id: params.therapist_id,
    };
    let page = state
        .notes
        .list_notes(Some(&principal), filter, params.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

pub async fn read_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, ApiError> {
    let view = state.notes.read_note(Some(&principal), &id).await?;
    Ok(Json(NoteResponse {
        note: view.note,
        content: NoteContent::from_plaintext(&view.content),
    }))
}

pub async fn update_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<Json<NoteSummary>, ApiError> {
    let plaintext = seal_input(&body.content)?;
    let summary = state
        .notes
        .update_note(Some(&principal), &id, &plaintext, body.expected_version)
        .await?;
    Ok(Json(summary))
}

fn seal_input(content: &NoteContent) -> Result<String, ApiError> {
    content
        .to_plaintext()
        .map_err(|e| ApiError::Internal(format!("note content serialization failed: {e}")))
}
