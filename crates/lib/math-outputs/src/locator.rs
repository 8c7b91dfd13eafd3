//! Saves chart images under the output directory and builds public URLs for
//! them from whatever the current request reveals about the server address.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::HeaderMap;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use rmcp::model::{Content, RawContent};
use uuid::Uuid;

use crate::cache::PlotUrlCache;
use crate::error::{OutputError, OutputResult};
use crate::request::RequestSnapshot;

pub const DEFAULT_OUTPUT_DIR: &str = "/outputs";
pub const OUTPUT_URL_PREFIX: &str = "/outputs";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A file written by [`PlotOutputs::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlot {
    pub path: PathBuf,
    pub session_id: String,
    pub url: String,
}

/// Output directory, URL cache, and clock used to place plot files.
#[derive(Clone)]
pub struct PlotOutputs {
    output_dir: PathBuf,
    cache: PlotUrlCache,
    clock: Clock,
}

impl PlotOutputs {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, cache: PlotUrlCache) -> Self {
        Self {
            output_dir: output_dir.into(),
            cache,
            clock: Arc::new(Utc::now),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub const fn cache(&self) -> &PlotUrlCache {
        &self.cache
    }

    /// Saves the first image in `content` and records its URL for the
    /// session. Every failure is logged and yields `None`.
    pub async fn publish(&self, content: &[Content], request: &RequestSnapshot) -> Option<String> {
        let saved = self.save(content, request)?;
        self.cache.record(&saved.session_id, &saved.url).await;
        Some(saved.url)
    }

    /// Writes the first image in `content` to disk without touching the cache.
    #[must_use]
    pub fn save(&self, content: &[Content], request: &RequestSnapshot) -> Option<SavedPlot> {
        match self.try_save(content, request) {
            Ok(saved) => {
                tracing::info!(path = %saved.path.display(), url = %saved.url, "saved plot output");
                Some(saved)
            }
            Err(err @ (OutputError::NoImage | OutputError::NoBaseUrl)) => {
                tracing::debug!("skipping plot file save: {err}");
                None
            }
            Err(err @ OutputError::UnsupportedMime(_)) => {
                tracing::warn!("{err}");
                None
            }
            Err(err) => {
                tracing::error!("{err}");
                None
            }
        }
    }

    fn try_save(&self, content: &[Content], request: &RequestSnapshot) -> OutputResult<SavedPlot> {
        let (data, mime_type) = content
            .iter()
            .find_map(|item| match &item.raw {
                RawContent::Image(image) => Some((image.data.as_str(), image.mime_type.as_str())),
                _ => None,
            })
            .ok_or(OutputError::NoImage)?;

        let headers = request.headers();
        let base_url = base_url(request, headers.as_ref()).ok_or(OutputError::NoBaseUrl)?;
        let session_id = sanitize_session_id(requested_session_id(request, headers.as_ref()));
        let ext = extension_for(mime_type)
            .ok_or_else(|| OutputError::UnsupportedMime(mime_type.to_string()))?;

        let now = (self.clock)();
        let date = now.format("%Y-%m-%d").to_string();
        let timestamp = now.format("%Y%m%d%H%M%S").to_string();
        let target_dir = self.output_dir.join("charts").join(&date).join(&session_id);
        fs::create_dir_all(&target_dir).map_err(|source| OutputError::CreateDir {
            path: target_dir.clone(),
            source,
        })?;

        let bytes = STANDARD.decode(data)?;
        let (path, mut file) = create_unique(&target_dir, &timestamp, ext)
            .map_err(|source| OutputError::Write { path: target_dir.clone(), source })?;
        file.write_all(&bytes)
            .map_err(|source| OutputError::Write { path: path.clone(), source })?;

        let filename = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        let prefix = OUTPUT_URL_PREFIX.trim_end_matches('/');
        let url = format!("{base_url}{prefix}/charts/{date}/{session_id}/{filename}");
        Ok(SavedPlot { path, session_id, url })
    }
}

/// Blank values fall back to [`DEFAULT_OUTPUT_DIR`].
#[must_use]
pub fn resolve_output_dir(raw: &str) -> PathBuf {
    match raw.trim() {
        "" => PathBuf::from(DEFAULT_OUTPUT_DIR),
        dir => PathBuf::from(dir),
    }
}

/// `chart-<timestamp>.<ext>`, or the first free `chart-<timestamp>-<n>.<ext>`.
fn create_unique(dir: &Path, timestamp: &str, ext: &str) -> io::Result<(PathBuf, File)> {
    let mut counter = 0_u32;
    loop {
        let name = match counter {
            0 => format!("chart-{timestamp}.{ext}"),
            n => format!("chart-{timestamp}-{n}.{ext}"),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(err) => return Err(err),
        }
    }
}

fn header<'h>(headers: Option<&'h HeaderMap>, name: &str) -> Option<&'h str> {
    headers?
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn first_token(value: &str) -> &str {
    value.split(',').next().unwrap_or_default().trim()
}

/// `"{proto}://{host}"` from forwarded headers, `Host`, or the request URI.
#[must_use]
pub fn base_url(request: &RequestSnapshot, headers: Option<&HeaderMap>) -> Option<String> {
    let mut protocol = header(headers, "x-forwarded-proto").map(first_token).map(str::to_string);
    let mut host = header(headers, "x-forwarded-host")
        .or_else(|| header(headers, "host"))
        .map(first_token)
        .map(str::to_string);

    let uri = request.uri();
    if let Some(uri) = uri {
        if host.is_none() {
            host = uri.host().map(|name| match uri.port_u16() {
                Some(port) => format!("{name}:{port}"),
                None => name.to_string(),
            });
        }
        if protocol.is_none() {
            protocol = uri.scheme_str().map(str::to_string);
        }
    }

    let host = host.filter(|host| !host.is_empty())?;
    let protocol = match protocol.as_deref() {
        Some(proto @ ("http" | "https")) => proto,
        _ if uri.and_then(|uri| uri.scheme_str()) == Some("https") => "https",
        _ => "http",
    };
    Some(format!("{protocol}://{host}"))
}

fn requested_session_id(request: &RequestSnapshot, headers: Option<&HeaderMap>) -> Option<String> {
    header(headers, "mcp-session-id")
        .or_else(|| request.meta_session_id())
        .map(str::to_string)
}

/// Keeps `[A-Za-z0-9_-]` and drops the rest; empty results get a fresh id.
#[must_use]
pub fn sanitize_session_id(raw: Option<String>) -> String {
    let cleaned = raw
        .unwrap_or_default()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
        .collect::<String>();
    if cleaned.is_empty() { generate_session_id() } else { cleaned }
}

fn generate_session_id() -> String {
    format!("session-{}", Uuid::new_v4().simple())
}

fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Uri};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn base(uri: &'static str, pairs: &[(&'static str, &'static str)]) -> Option<String> {
        let snapshot = RequestSnapshot::new().with_request(Uri::from_static(uri), headers(pairs));
        base_url(&snapshot, snapshot.headers().as_ref())
    }

    #[test]
    fn forwarded_headers_take_priority() {
        assert_eq!(
            base("/mcp", &[
                ("x-forwarded-proto", "https, http"),
                ("x-forwarded-host", "plots.example.com, inner"),
                ("host", "localhost:8008"),
            ]),
            Some("https://plots.example.com".to_string())
        );
        assert_eq!(base("/mcp", &[("host", "localhost:8008")]), Some("http://localhost:8008".to_string()));
    }

    #[test]
    fn uri_fills_in_missing_host_and_scheme() {
        assert_eq!(base("https://api.example.com:9443/mcp", &[]), Some("https://api.example.com:9443".to_string()));
        assert_eq!(
            base("https://api.example.com/mcp", &[("x-forwarded-proto", "ws")]),
            Some("https://api.example.com".to_string())
        );
        assert_eq!(base("/mcp", &[("x-forwarded-proto", "ftp"), ("host", "h")]), Some("http://h".to_string()));
        assert_eq!(base("/mcp", &[]), None);
    }

    #[test]
    fn session_ids_are_sanitized() {
        assert_eq!(sanitize_session_id(Some("abc_DEF-123".into())), "abc_DEF-123");
        assert_eq!(sanitize_session_id(Some("../etc/passwd".into())), "etcpasswd");
        let fresh = sanitize_session_id(Some("///".into()));
        assert!(fresh.starts_with("session-"));
        assert_eq!(fresh.len(), "session-".len() + 32);
        assert!(sanitize_session_id(None).starts_with("session-"));
    }

    #[test]
    fn mime_types_map_to_extensions() {
        assert_eq!(extension_for("image/PNG"), Some("png"));
        assert_eq!(extension_for("image/svg+xml"), Some("svg"));
        assert_eq!(extension_for("image/jpeg"), None);
    }

    #[test]
    fn blank_output_dir_uses_default() {
        assert_eq!(resolve_output_dir("  "), PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(resolve_output_dir("/tmp/plots"), PathBuf::from("/tmp/plots"));
    }
}
