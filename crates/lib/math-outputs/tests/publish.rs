use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, Uri};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{TimeZone, Utc};
use math_outputs::{PlotOutputs, PlotUrlCache, RequestSnapshot, router};
use rmcp::model::Content;
use serde_json::{Value, json};
use tower::ServiceExt;

const SESSION: &str = "abc123";

fn outputs(dir: &std::path::Path) -> PlotOutputs {
    let fixed = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 5).single().expect("valid time");
    PlotOutputs::new(dir, PlotUrlCache::default()).with_clock(Arc::new(move || fixed))
}

fn request() -> RequestSnapshot {
    let mut headers = HeaderMap::new();
    headers.insert("host", HeaderValue::from_static("localhost:8008"));
    headers.insert("mcp-session-id", HeaderValue::from_static(SESSION));
    RequestSnapshot::new().with_request(Uri::from_static("/mcp"), headers)
}

fn chart_content(payload: &[u8]) -> Vec<Content> {
    vec![
        Content::text("rendered"),
        Content::image(STANDARD.encode(payload), "image/png"),
    ]
}

#[tokio::test]
async fn saves_files_with_collision_suffixes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outputs = outputs(dir.path());

    let first = outputs.publish(&chart_content(b"one"), &request()).await.expect("first url");
    let second = outputs.publish(&chart_content(b"two"), &request()).await.expect("second url");
    assert_eq!(
        first,
        "http://localhost:8008/outputs/charts/2024-05-17/abc123/chart-20240517093005.png"
    );
    assert_eq!(
        second,
        "http://localhost:8008/outputs/charts/2024-05-17/abc123/chart-20240517093005-1.png"
    );

    let session_dir = dir.path().join("charts").join("2024-05-17").join(SESSION);
    let written = std::fs::read(session_dir.join("chart-20240517093005-1.png")).expect("file");
    assert_eq!(written, b"two");

    let latest = outputs.cache().get(SESSION).await.expect("cached");
    assert_eq!(latest.url, second);
}

#[tokio::test]
async fn skips_without_headers_or_images() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outputs = outputs(dir.path());

    assert!(outputs.publish(&chart_content(b"x"), &RequestSnapshot::new()).await.is_none());
    assert!(outputs.publish(&[Content::text("no image")], &request()).await.is_none());
    let jpeg = vec![Content::image(STANDARD.encode(b"x"), "image/jpeg")];
    assert!(outputs.publish(&jpeg, &request()).await.is_none());
    let broken = vec![Content::image("%%%not base64%%%", "image/png")];
    assert!(outputs.publish(&broken, &request()).await.is_none());
    assert!(outputs.cache().is_empty().await);
}

#[tokio::test]
async fn metadata_supplies_headers_and_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outputs = outputs(dir.path());
    let Value::Object(meta) = json!({
        "http": {"headers": {"X-Forwarded-Proto": "https", "X-Forwarded-Host": "plots.example.com"}},
        "mcp_session_id": "from/meta"
    }) else {
        unreachable!("literal object");
    };
    let snapshot = RequestSnapshot::new().with_meta(meta);
    let url = outputs.publish(&chart_content(b"svg"), &snapshot).await.expect("url");
    assert_eq!(
        url,
        "https://plots.example.com/outputs/charts/2024-05-17/frommeta/chart-20240517093005.png"
    );
}

#[tokio::test]
async fn routes_serve_files_and_latest_urls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outputs = outputs(dir.path());
    let url = outputs.publish(&chart_content(b"png bytes"), &request()).await.expect("url");
    let app = router(&outputs);

    let response = app
        .clone()
        .oneshot(Request::get(format!("/plot-url/{SESSION}")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.expect("body"))
            .expect("json");
    assert_eq!(body["session_id"], SESSION);
    assert_eq!(body["url"], url.as_str());
    assert!(body["created_at"].is_string());

    let response = app
        .clone()
        .oneshot(Request::get("/plot-url/unknown").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.expect("body"))
            .expect("json");
    assert!(body["error"].as_str().is_some_and(|message| message.contains("unknown")));

    let response = app
        .oneshot(
            Request::get("/outputs/charts/2024-05-17/abc123/chart-20240517093005.png")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(&bytes[..], b"png bytes");
}
