//! Error type for the whole mirror pipeline.
//!
//! Every failure is a [`MirrorError`]: a structured [`ErrorKind`] plus a stack of
//! context frames. Each enclosing step of the walk pushes one frame while the
//! error propagates, so the final message reads as a breadcrumb trail from the
//! failure point back up to the tree root.
//!
//! ```text
//! embedded image not found
//!   when reading document data from https://aip.example/pages/D0001.html
//!   when processing https://aip.example/pages/C0004B.html
//!   when processing https://aip.example/pages/C0004A.html
//! ```

use std::fmt;

use thiserror::Error;

/// What went wrong, independent of where.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("malformed refresh directive: {0}")]
    RedirectDirectiveMalformed(String),

    #[error("more than {limit} refresh redirects starting at {url}")]
    RedirectHopLimitExceeded { url: String, limit: usize },

    #[error("tree item decode failure: {0}")]
    TreeItemDecodeFailure(String),

    #[error("embedded image not found")]
    EmbeddedImageMissing,

    #[error("unexpected image encoding: {0}")]
    UnexpectedImageEncoding(String),

    #[error("network failure for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("filesystem failure: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("image conversion failed: {0}")]
    ImageConversion(String),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("tree deeper than {limit} levels at {url}")]
    TreeDepthExceeded { url: String, limit: usize },
}

/// An [`ErrorKind`] with the chain of "when ..." frames collected on the way up.
#[derive(Debug)]
pub struct MirrorError {
    kind: ErrorKind,
    context: Vec<String>,
}

pub type Result<T> = std::result::Result<T, MirrorError>;

impl MirrorError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Context frames, innermost first.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn push_context(mut self, frame: impl Into<String>) -> Self {
        self.context.push(frame.into());
        self
    }
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.context {
            write!(f, "\n  when {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for MirrorError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Filesystem(e))
    }
}

impl From<url::ParseError> for MirrorError {
    fn from(e: url::ParseError) -> Self {
        Self::new(ErrorKind::InvalidUrl(e))
    }
}

impl From<image::ImageError> for MirrorError {
    fn from(e: image::ImageError) -> Self {
        Self::new(ErrorKind::ImageConversion(e.to_string()))
    }
}

impl From<base64::DecodeError> for MirrorError {
    fn from(e: base64::DecodeError) -> Self {
        Self::new(ErrorKind::UnexpectedImageEncoding(format!(
            "invalid base64 payload: {e}"
        )))
    }
}

/// Attach a context frame to any error convertible into [`MirrorError`].
pub trait ResultExt<T> {
    fn context(self, frame: impl Into<String>) -> Result<T>;

    fn with_context<F>(self, frame: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MirrorError>,
{
    fn context(self, frame: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().push_context(frame))
    }

    fn with_context<F>(self, frame: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().push_context(frame()))
    }
}
