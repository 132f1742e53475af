//! API integration tests.
//!
//! Run with: `cargo test -p tubegate-tests --test api_tests`

use pretty_assertions::assert_eq;
use reqwest::{Method, StatusCode, header};
use std::time::Duration;
use tubegate_tests::{
    context::{TestContext, TestSettings},
    fixtures::{ScriptedDownload, ScriptedEngine},
    helpers::wait_for,
};

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

async fn detail(resp: reqwest::Response) -> String {
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    body["detail"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let ctx = TestContext::new().await.expect("Failed to create test context");

    let resp = ctx.client.get("/api/health").await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_video_info_filters_formats_and_caches() {
    let ctx = TestContext::new().await.unwrap();

    let resp = ctx.client.video_info(URL).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let first: serde_json::Value = resp.json().await.unwrap();

    assert_eq!(first["title"], "Never Gonna Give You Up");
    assert_eq!(first["duration"], 212);
    let exts: Vec<&str> = first["formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["ext"].as_str().unwrap())
        .collect();
    assert_eq!(exts, vec!["mp4", "mp4", "webm", "m4a"]);

    // Same content through a short link is served from cache.
    let resp = ctx
        .client
        .video_info("https://youtu.be/dQw4w9WgXcQ")
        .await
        .unwrap();
    let second: serde_json::Value = resp.json().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.engine.info_calls(), 1);
    assert!(ctx.cache_dir().join("dQw4w9WgXcQ.json").exists());
}

#[tokio::test]
async fn test_invalid_url_is_bad_request() {
    let ctx = TestContext::new().await.unwrap();

    let resp = ctx.client.video_info("not a url").await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(detail(resp).await.starts_with("Invalid URL"));
    assert_eq!(ctx.engine.info_calls(), 0);
}

#[tokio::test]
async fn test_engine_failure_is_bad_request() {
    let engine = ScriptedEngine::new().failing_info("[youtube] dQw4w9WgXcQ: Video unavailable");
    let ctx = TestContext::with_engine(engine).await.unwrap();

    let resp = ctx.client.video_info(URL).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        detail(resp).await,
        "Video download error: [youtube] dQw4w9WgXcQ: Video unavailable"
    );
    assert!(!ctx.cache_dir().join("dQw4w9WgXcQ.json").exists());
}

#[tokio::test]
async fn test_malformed_body_is_unprocessable() {
    let ctx = TestContext::new().await.unwrap();

    let resp = ctx
        .client
        .post("/api/video-info", &serde_json::json!({ "link": URL }))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_third_request_over_quota_is_rejected() {
    let settings = TestSettings {
        max_requests: 2,
        window_secs: 60,
        ..Default::default()
    };
    let ctx = TestContext::start(ScriptedEngine::new(), settings).await.unwrap();

    assert_eq!(ctx.client.video_info(URL).await.unwrap().status(), StatusCode::OK);
    assert_eq!(ctx.client.video_info(URL).await.unwrap().status(), StatusCode::OK);

    let resp = ctx.client.video_info(URL).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = resp.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(detail(resp).await, "Too many requests. Please try again later.");

    // Rejected requests never reach a handler.
    assert_eq!(ctx.engine.info_calls(), 1);
}

#[tokio::test]
async fn test_download_streams_artifact_and_removes_it() {
    let bytes: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
    let engine = ScriptedEngine::new().download(ScriptedDownload::Produce {
        name: "Never Gonna Give You Up.mp4".to_string(),
        bytes: bytes.clone(),
    });
    let settings = TestSettings {
        chunk_size: 4096,
        ..Default::default()
    };
    let ctx = TestContext::start(engine, settings).await.unwrap();

    let resp = ctx.client.download(URL, "22").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(resp.headers()[header::CONTENT_LENGTH], "100000");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Never Gonna Give You Up.mp4\""
    );

    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), bytes.as_slice());

    let ctx = &ctx;
    let removed = wait_for(Duration::from_secs(2), Duration::from_millis(20), || async move {
        ctx.artifacts().is_empty()
    })
    .await;
    assert!(removed, "artifact left behind: {:?}", ctx.artifacts());
    assert_eq!(ctx.engine.download_calls(), 1);
}

#[tokio::test]
async fn test_abandoned_download_removes_artifact() {
    let engine = ScriptedEngine::new().download(ScriptedDownload::Produce {
        name: "Big.webm".to_string(),
        bytes: vec![7u8; 4 * 1024 * 1024],
    });
    let settings = TestSettings {
        chunk_size: 1024,
        ..Default::default()
    };
    let ctx = TestContext::start(engine, settings).await.unwrap();

    let resp = ctx.client.download(URL, "251").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // Hang up without reading the body.
    drop(resp);

    let ctx = &ctx;
    let removed = wait_for(Duration::from_secs(5), Duration::from_millis(20), || async move {
        ctx.artifacts().is_empty()
    })
    .await;
    assert!(removed, "artifact left behind: {:?}", ctx.artifacts());
}

#[tokio::test]
async fn test_missing_artifact_is_not_found() {
    let engine = ScriptedEngine::new().download(ScriptedDownload::ReportOnly {
        name: "Vanished.mp4".to_string(),
    });
    let ctx = TestContext::with_engine(engine).await.unwrap();

    let resp = ctx.client.download(URL, "22").await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(detail(resp).await, "File not found after download");
}

#[tokio::test]
async fn test_download_engine_failure() {
    let engine = ScriptedEngine::new().download(ScriptedDownload::Refuse(
        "Requested format is not available".to_string(),
    ));
    let ctx = TestContext::with_engine(engine).await.unwrap();

    let resp = ctx.client.download(URL, "999").await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        detail(resp).await,
        "Video download error: Requested format is not available"
    );
    assert!(ctx.artifacts().is_empty());
}

#[tokio::test]
async fn test_download_without_format_id_is_bad_request() {
    let ctx = TestContext::new().await.unwrap();

    let resp = ctx
        .client
        .post("/api/download", &serde_json::json!({ "url": URL }))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.engine.download_calls(), 0);
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let ctx = TestContext::new().await.unwrap();

    let resp = ctx
        .client
        .raw()
        .request(Method::OPTIONS, ctx.client.url("/api/video-info"))
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}
