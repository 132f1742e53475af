//! Video metadata handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use std::sync::Arc;
use tubegate_core::VideoInfo;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub url: String,
}

pub async fn video_info(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Result<Json<VideoInfo>, ApiError> {
    let Json(request) = payload?;
    let info = state.metadata.fetch_info(&request.url).await?;
    Ok(Json(info))
}
