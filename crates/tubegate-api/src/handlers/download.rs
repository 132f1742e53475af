//! Download handler.

use axum::{
    Json,
    body::Body,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::handlers::video::VideoRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub format_id: String,
}

/// Stream the requested rendition as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DownloadParams>, QueryRejection>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let Json(request) = payload?;

    let download = state
        .downloads
        .download(&request.url, &params.format_id)
        .await?;

    info!(
        filename = %download.filename,
        size_bytes = download.size_bytes,
        "Streaming download"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, download.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&download.filename),
        )
        .body(Body::from_stream(download.stream))
        .map_err(|e| {
            ApiError::from(tubegate_core::Error::InternalFailure(format!(
                "failed to build response: {}",
                e
            )))
        })
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// name percent-encoded in `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_name() {
        assert_eq!(
            content_disposition("My Clip.mp4"),
            "attachment; filename=\"My Clip.mp4\""
        );
    }

    #[test]
    fn test_quotes_are_replaced() {
        assert_eq!(
            content_disposition("a\"b.mp4"),
            "attachment; filename=\"a_b.mp4\"; filename*=UTF-8''a%22b.mp4"
        );
    }

    #[test]
    fn test_non_ascii_name_is_encoded() {
        assert_eq!(
            content_disposition("Café.webm"),
            "attachment; filename=\"Caf_.webm\"; filename*=UTF-8''Caf%C3%A9.webm"
        );
    }
}
