//! HTTP handlers.
//!
//! Thin transport layer: parse the JSON payload, hand already-parsed values
//! to [`Contest`](crate::contest::Contest), map the typed result onto a
//! status code (see `error.rs`). No contest rule lives here.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::error::ContestError;
use crate::model::{EntryId, VoterImport};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitEntryRequest {
    pub email: String,
    pub name: String,
    pub caption: Option<String>,
    /// Opaque reference into external photo storage; stored as-is.
    pub media_ref: String,
}

#[derive(Deserialize)]
pub struct CastVoteRequest {
    pub email: String,
    pub contestant_id: EntryId,
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct AdminKeyParams {
    pub key: String,
}

#[derive(Serialize)]
pub struct LeaderboardRowBody {
    pub entry_id: EntryId,
    pub name: String,
    pub caption: Option<String>,
    pub votes: u64,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

pub async fn submit_entry_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitEntryRequest>,
) -> Result<impl IntoResponse, ContestError> {
    let entry = state
        .contest
        .submit_entry(&payload.email, &payload.name, payload.caption, payload.media_ref)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ContestError> {
    let entries = state.contest.list_entries().await?;
    Ok(Json(entries))
}

pub async fn cast_vote_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ContestError> {
    let vote = state
        .contest
        .cast_vote(&payload.email, payload.contestant_id)
        .await?;
    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, ContestError> {
    let rows = state.contest.leaderboard(params.limit).await?;
    let body: Vec<LeaderboardRowBody> = rows
        .into_iter()
        .map(|row| LeaderboardRowBody {
            entry_id: row.entry.id,
            name: row.entry.display_name,
            caption: row.entry.caption,
            votes: row.vote_count,
        })
        .collect();
    Ok(Json(body))
}

pub async fn voter_status_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ContestError> {
    let status = state.contest.voter_status(&email).await?;
    Ok(Json(status))
}

pub async fn import_voters_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminKeyParams>,
    Json(rows): Json<Vec<VoterImport>>,
) -> Result<impl IntoResponse, ContestError> {
    if params.key != state.config.admin_key {
        return Err(ContestError::InvalidAdminKey);
    }
    let imported = state.contest.import_voters(&rows).await?;
    Ok(Json(ImportResponse { imported }))
}
