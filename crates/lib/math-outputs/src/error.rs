use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Reasons a plot could not be saved. None of these reach the tool caller;
/// the locator logs them and carries on without a URL.
#[derive(Debug)]
pub enum OutputError {
    NoImage,
    NoBaseUrl,
    UnsupportedMime(String),
    CreateDir { path: PathBuf, source: io::Error },
    Decode(base64::DecodeError),
    Write { path: PathBuf, source: io::Error },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoImage => write!(f, "no image content found in plot output"),
            Self::NoBaseUrl => write!(f, "no request base URL available"),
            Self::UnsupportedMime(mime) => write!(f, "unsupported image mime type: {mime}"),
            Self::CreateDir { path, source } => {
                write!(f, "failed to create output directory {}: {source}", path.display())
            }
            Self::Decode(err) => write!(f, "failed to decode image data: {err}"),
            Self::Write { path, source } => {
                write!(f, "failed to write plot file {}: {source}", path.display())
            }
        }
    }
}

impl Error for OutputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Decode(err) => Some(err),
            Self::NoImage | Self::NoBaseUrl | Self::UnsupportedMime(_) => None,
        }
    }
}

impl From<base64::DecodeError> for OutputError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err)
    }
}

pub type OutputResult<T> = Result<T, OutputError>;
