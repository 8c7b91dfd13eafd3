//! What a tool call knows about the HTTP request that carried it.
//!
//! Transports expose this in different shapes. Streamable HTTP hands over the
//! request parts directly; other hosts tuck headers into protocol metadata,
//! either as an ASGI-style `scope.headers` list of pairs or as a plain object
//! under `headers` or `http.headers`. The snapshot keeps all of them and the
//! probing below picks the first usable source.

use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};
use serde_json::{Map, Value};

const META_SESSION_KEYS: [&str; 3] = ["mcp-session-id", "mcp_session_id", "session_id"];

/// Request parts plus protocol metadata captured from one tool call.
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    uri: Option<Uri>,
    headers: Option<HeaderMap>,
    meta: Map<String, Value>,
}

impl RequestSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        Self::new().with_request(parts.uri.clone(), parts.headers.clone())
    }

    #[must_use]
    pub fn with_request(mut self, uri: Uri, headers: HeaderMap) -> Self {
        self.uri = Some(uri);
        self.headers = Some(headers);
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub const fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    /// Headers from the first source that has any: the direct request, then
    /// `scope.headers` or `headers` in metadata, then `http.headers`.
    #[must_use]
    pub fn headers(&self) -> Option<HeaderMap> {
        if let Some(headers) = &self.headers {
            return Some(headers.clone());
        }
        let scope = self
            .meta
            .get("scope")
            .and_then(|scope| scope.get("headers"))
            .and_then(headers_from_pairs);
        if scope.is_some() {
            return scope;
        }
        if let Some(Value::Object(headers)) = self.meta.get("headers") {
            return Some(headers_from_object(headers));
        }
        match self.meta.get("http").and_then(|http| http.get("headers")) {
            Some(Value::Object(headers)) => Some(headers_from_object(headers)),
            _ => None,
        }
    }

    /// Session id from metadata, checked after the `mcp-session-id` header.
    #[must_use]
    pub fn meta_session_id(&self) -> Option<&str> {
        META_SESSION_KEYS.iter().find_map(|key| {
            self.meta
                .get(*key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, value);
    }
}

/// `[[name, value], ...]`; malformed pairs are skipped.
fn headers_from_pairs(raw: &Value) -> Option<HeaderMap> {
    let mut headers = HeaderMap::new();
    for pair in raw.as_array()? {
        if let Some([Value::String(name), Value::String(value)]) = pair.as_array().map(Vec::as_slice) {
            insert_header(&mut headers, name, value);
        }
    }
    (!headers.is_empty()).then_some(headers)
}

fn headers_from_object(raw: &Map<String, Value>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in raw {
        match value {
            Value::String(value) => insert_header(&mut headers, name, value),
            Value::Number(value) => insert_header(&mut headers, name, &value.to_string()),
            _ => {}
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn direct_request_headers_win() {
        let mut direct = HeaderMap::new();
        direct.insert("host", HeaderValue::from_static("direct:8008"));
        let snapshot = RequestSnapshot::new()
            .with_request(Uri::from_static("/mcp"), direct)
            .with_meta(meta(json!({"headers": {"Host": "meta"}})));
        let headers = snapshot.headers().expect("headers");
        assert_eq!(headers.get("host").and_then(|v| v.to_str().ok()), Some("direct:8008"));
    }

    #[test]
    fn scope_pairs_then_meta_objects() {
        let snapshot = RequestSnapshot::new().with_meta(meta(json!({
            "scope": {"headers": [["Host", "scope.example"], ["broken"]]},
            "headers": {"Host": "meta.example"}
        })));
        let headers = snapshot.headers().expect("headers");
        assert_eq!(headers.get("host").and_then(|v| v.to_str().ok()), Some("scope.example"));

        let snapshot = RequestSnapshot::new()
            .with_meta(meta(json!({"http": {"headers": {"X-Forwarded-Host": "proxy.example"}}})));
        let headers = snapshot.headers().expect("headers");
        assert_eq!(
            headers.get("x-forwarded-host").and_then(|v| v.to_str().ok()),
            Some("proxy.example")
        );

        assert!(RequestSnapshot::new().headers().is_none());
    }

    #[test]
    fn session_id_keys_in_order() {
        let snapshot = RequestSnapshot::new()
            .with_meta(meta(json!({"session_id": "third", "mcp_session_id": "second"})));
        assert_eq!(snapshot.meta_session_id(), Some("second"));
        let snapshot = RequestSnapshot::new().with_meta(meta(json!({"session_id": 7})));
        assert_eq!(snapshot.meta_session_id(), None);
    }
}
