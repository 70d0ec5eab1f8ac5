use crate::{AppState, errors::AppError, service::DEFAULT_LEADERBOARD_LIMIT};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

// Fields arrive camelCase on the wire; absent ones fall through to the
// service so its validation produces the 400, not the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemeRequest {
    title: Option<String>,
    image_url: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    vote_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    user_id: Option<String>,
    credits: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    top: Option<usize>,
}

/// POST /api/memes
pub async fn create_meme(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMemeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let meme = state
        .service
        .create_meme(body.title.as_deref().unwrap_or(""), body.image_url, body.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(meme)))
}

/// GET /api/memes
pub async fn list_memes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let memes = state.service.list_memes().await?;
    tracing::debug!("Handler retrieved {} memes", memes.len());
    Ok(Json(memes))
}

/// POST /api/memes/{id}/vote
pub async fn vote(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let meme_id = Uuid::parse_str(&id_str)?;
    let outcome = state
        .service
        .apply_vote(meme_id, body.vote_type.as_deref().unwrap_or(""))
        .await?;
    Ok(Json(outcome))
}

/// POST /api/memes/{id}/bid
pub async fn place_bid(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<BidRequest>,
) -> Result<impl IntoResponse, AppError> {
    let meme_id = Uuid::parse_str(&id_str)?;
    let bid = state
        .service
        .apply_bid(
            meme_id,
            body.user_id.as_deref().unwrap_or(""),
            body.credits.unwrap_or(0),
        )
        .await?;
    Ok(Json(bid))
}

/// GET /api/leaderboard?top=N
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.top.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let memes = state.service.top_memes(limit).await?;
    Ok(Json(memes))
}
