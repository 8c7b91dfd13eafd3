use std::borrow::Cow;

use math_core::MathResult;
use math_outputs::RequestSnapshot;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer};
use serde::Serialize;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Computation tools always succeed at the protocol level; failures travel as
/// `Error: ...` text.
pub(crate) fn text_result(result: MathResult<String>) -> CallToolResult {
    let text = result.unwrap_or_else(|err| format!("Error: {err}"));
    CallToolResult::success(vec![Content::text(text)])
}

/// Runs a CPU-heavy computation off the async executor and wraps its text.
pub(crate) async fn blocking_text<F>(task: &'static str, compute: F) -> Result<CallToolResult, ErrorData>
where
    F: FnOnce() -> MathResult<String> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(compute)
        .await
        .map_err(|err| mcp_err(ErrorCode::INTERNAL_ERROR, format!("{task} task failed: {err}")))?;
    Ok(text_result(result))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> MathResult<String> {
    serde_json::to_string(value)
        .map_err(|err| math_core::MathError::Evaluation(format!("could not serialize result: {err}")))
}

/// HTTP request parts (streamable HTTP only) plus the call's `_meta`.
pub(crate) fn request_snapshot(ctx: &RequestContext<RoleServer>) -> RequestSnapshot {
    let snapshot = ctx
        .extensions
        .get::<axum::http::request::Parts>()
        .map_or_else(RequestSnapshot::new, RequestSnapshot::from_parts);
    snapshot.with_meta(ctx.meta.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use math_core::MathError;

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .find_map(|item| item.as_text().map(|text| text.text.clone()))
            .unwrap_or_default()
    }

    #[test]
    fn failures_become_error_text() {
        let ok = text_result(Ok("42".to_string()));
        assert_eq!(text(&ok), "42");
        assert_ne!(ok.is_error, Some(true));
        let failed = text_result(Err(MathError::InvalidInput("bad input".into())));
        assert_eq!(text(&failed), "Error: bad input");
        assert_ne!(failed.is_error, Some(true));
    }

    #[tokio::test]
    async fn blocking_work_reports_like_inline_work() {
        let ok = blocking_text("sum", || Ok((1..=10).sum::<i32>().to_string()))
            .await
            .expect("task joins");
        assert_eq!(text(&ok), "55");
        let failed = blocking_text("fail", || Err(MathError::InvalidInput("nope".into())))
            .await
            .expect("task joins");
        assert_eq!(text(&failed), "Error: nope");
    }
}
