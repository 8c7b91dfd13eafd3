//! HTTP routes serving saved plots and the latest plot URL per session.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::cache::{PlotUrlCache, PlotUrlEntry};
use crate::locator::{OUTPUT_URL_PREFIX, PlotOutputs};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse { error: self.message });
        (self.status, payload).into_response()
    }
}

/// `/outputs/*` static files and `GET /plot-url/:session_id`.
pub fn router(outputs: &PlotOutputs) -> Router {
    Router::new()
        .route("/plot-url/:session_id", get(plot_url))
        .with_state(outputs.cache().clone())
        .nest_service(OUTPUT_URL_PREFIX, ServeDir::new(outputs.output_dir()))
}

async fn plot_url(
    State(cache): State<PlotUrlCache>,
    Path(session_id): Path<String>,
) -> Result<Json<PlotUrlEntry>, ApiError> {
    cache
        .get(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No plot URL found for session: {session_id}")))
}
