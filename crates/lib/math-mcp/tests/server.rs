use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, Uri};
use math_charts::{BarChart, PieChart};
use math_mcp::MathMcp;
use math_mcp::server::{McpHttpServerConfig, http_app};
use math_outputs::{PlotOutputs, PlotUrlCache, RequestSnapshot};
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};
use tower::ServiceExt;

fn outputs(dir: &std::path::Path) -> PlotOutputs {
    PlotOutputs::new(dir, PlotUrlCache::default())
}

fn http_request() -> RequestSnapshot {
    let mut headers = HeaderMap::new();
    headers.insert("host", HeaderValue::from_static("localhost:8008"));
    headers.insert("mcp-session-id", HeaderValue::from_static("sess-1"));
    RequestSnapshot::new().with_request(Uri::from_static("/mcp"), headers)
}

fn texts(result: &CallToolResult) -> Vec<String> {
    result
        .content
        .iter()
        .filter_map(|item| item.as_text().map(|text| text.text.clone()))
        .collect()
}

fn bar_chart() -> BarChart {
    BarChart {
        categories: vec!["a".into(), "b".into()],
        values: vec![1.0, 2.0],
        ..BarChart::default()
    }
}

#[test]
fn registers_every_tool() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut names = MathMcp::new(outputs(dir.path())).tool_names();
    names.sort();
    let mut expected = vec![
        "health",
        "simplify",
        "solve",
        "derivative",
        "integral",
        "expand",
        "factor",
        "evaluate",
        "latex",
        "to_fraction",
        "simplify_fraction",
        "solve_ode",
        "find_root",
        "describe_data",
        "ttest",
        "correlation",
        "linear_regression",
        "moving_average",
        "convert_unit",
        "plot_timeseries",
        "plot_bar_chart",
        "plot_histogram",
        "plot_scatter",
        "plot_heatmap",
        "plot_stacked_bar",
        "plot_stackplot",
        "plot_ode_solution",
        "plot_pie_chart",
    ];
    expected.sort_unstable();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn chart_over_http_carries_plot_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let server = MathMcp::new(outputs(dir.path()));

    let result = server
        .render_chart(bar_chart(), &http_request())
        .await
        .expect("render");
    assert_ne!(result.is_error, Some(true));

    let image = result
        .content
        .iter()
        .find_map(|item| match &item.raw {
            RawContent::Image(image) => Some(image.mime_type.clone()),
            _ => None,
        })
        .expect("image content");
    assert_eq!(image, "image/png");

    let url = texts(&result)
        .into_iter()
        .find_map(|text| text.strip_prefix("Plot URL: ").map(str::to_string))
        .expect("plot url line");
    assert!(url.starts_with("http://localhost:8008/outputs/charts/"));
    assert!(url.contains("/sess-1/chart-"));

    let cached = server.outputs().cache().get("sess-1").await.expect("cached");
    assert_eq!(cached.url, url);
}

#[tokio::test]
async fn chart_over_stdio_has_image_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let server = MathMcp::new(outputs(dir.path()));

    let result = server
        .render_chart(bar_chart(), &RequestSnapshot::new())
        .await
        .expect("render");
    assert_eq!(result.content.len(), 1);
    assert!(texts(&result).is_empty());
    assert!(server.outputs().cache().is_empty().await);
}

#[tokio::test]
async fn invalid_chart_is_a_tool_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let server = MathMcp::new(outputs(dir.path()));

    let chart = BarChart {
        categories: vec!["a".into()],
        values: vec![1.0, 2.0],
        ..BarChart::default()
    };
    let result = server.render_chart(chart, &http_request()).await.expect("render");
    assert_eq!(result.is_error, Some(true));
    let text = texts(&result).join("");
    assert!(text.starts_with("Error: Error creating bar chart: "), "{text}");

    let pie = PieChart {
        labels: vec!["a".into()],
        values: vec![1.0],
        output_format: "gif".into(),
        ..PieChart::default()
    };
    let result = server.render_chart(pie, &http_request()).await.expect("render");
    assert_eq!(result.is_error, Some(true));
    assert!(texts(&result).join("").contains("output_format must be 'png' or 'svg'"));
}

#[tokio::test]
async fn http_app_serves_health_and_plot_urls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outputs = outputs(dir.path());
    let server = MathMcp::new(outputs.clone());
    let app = http_app(&outputs, &McpHttpServerConfig::default());

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(&body[..], b"ok");

    server
        .render_chart(bar_chart(), &http_request())
        .await
        .expect("render");

    let response = app
        .oneshot(Request::get("/plot-url/sess-1").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value: Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(value["session_id"], "sess-1");
    assert!(value["url"].as_str().expect("url").ends_with(".png"));
}

async fn post_mcp(app: &Router, session: Option<&str>, message: &Value) -> axum::response::Response {
    let mut request = Request::post("/mcp")
        .header("host", "localhost:8008")
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream");
    if let Some(session) = session {
        request = request.header("mcp-session-id", session);
    }
    let request = request.body(Body::from(message.to_string())).expect("request");
    app.clone().oneshot(request).await.expect("response")
}

/// The JSON-RPC message carried in an SSE response body.
async fn rpc_message(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = String::from_utf8(body.to_vec()).expect("utf8");
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .find(|data| !data.is_empty())
        .map(|data| serde_json::from_str(data).expect("json-rpc message"))
        .unwrap_or_else(|| panic!("no data event in {body}"))
}

#[tokio::test]
async fn http_tool_call_records_plot_url_for_its_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outputs = outputs(dir.path());
    let config = McpHttpServerConfig::default()
        .with_sse_keep_alive(None)
        .with_sse_retry(None);
    let app = http_app(&outputs, &config);

    let initialize = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "math-mcp-tests", "version": "0.1.0"}
        }
    });
    let response = post_mcp(&app, None, &initialize).await;
    assert_eq!(response.status(), StatusCode::OK);
    let session = response
        .headers()
        .get("mcp-session-id")
        .and_then(|value| value.to_str().ok())
        .expect("session header")
        .to_string();
    let init = rpc_message(response).await;
    assert_eq!(init["id"], 1);
    assert!(init["result"]["serverInfo"].is_object(), "{init}");

    let initialized = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    let response = post_mcp(&app, Some(&session), &initialized).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let call = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {
            "name": "plot_bar_chart",
            "arguments": {"categories": ["a", "b"], "values": [1.0, 2.0]}
        }
    });
    let response = post_mcp(&app, Some(&session), &call).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reply = rpc_message(response).await;
    assert_eq!(reply["id"], 2);
    let content = reply["result"]["content"].as_array().expect("content");
    assert!(content.iter().any(|item| item["type"] == "image"), "{reply}");
    let url = content
        .iter()
        .filter_map(|item| item["text"].as_str())
        .find_map(|text| text.strip_prefix("Plot URL: "))
        .expect("plot url line")
        .to_string();
    assert!(url.starts_with("http://localhost:8008/outputs/charts/"), "{url}");
    assert!(url.contains(&format!("/{session}/chart-")), "{url}");

    let response = app
        .oneshot(
            Request::get(format!("/plot-url/{session}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value: Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(value["session_id"], session.as_str());
    assert_eq!(value["url"], url.as_str());
}
