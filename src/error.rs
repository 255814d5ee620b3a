//! The one error shape observed above the HTTP client.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Normalised error published by the client and the loader.
///
/// Transport failures (no response) and HTTP failures (non-2xx response) are
/// both folded into this shape by the client's error normaliser, so consumers
/// only branch on `status_code` when they care about it.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub status_code: Option<u16>,
    pub cause: Option<Arc<dyn Error + Send + Sync>>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            cause: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// `true` when the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }
}

// `cause` is opaque and deliberately left out of equality.
impl PartialEq for ErrorInfo {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.status_code == other.status_code
    }
}

impl Eq for ErrorInfo {}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (status {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for ErrorInfo {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

impl From<anyhow::Error> for ErrorInfo {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line.
        ErrorInfo::new(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_cause() {
        let io = std::io::Error::other("socket closed");
        let a = ErrorInfo::new("boom").with_status(500).with_cause(io);
        let b = ErrorInfo::new("boom").with_status(500);
        assert_eq!(a, b);
        assert_ne!(a, ErrorInfo::new("boom"));
    }

    #[test]
    fn test_display_includes_status() {
        assert_eq!(ErrorInfo::new("boom").to_string(), "boom");
        assert_eq!(
            ErrorInfo::new("missing").with_status(404).to_string(),
            "missing (status 404)"
        );
    }

    #[test]
    fn test_source_is_cause() {
        let io = std::io::Error::other("socket closed");
        let info = ErrorInfo::new("Network Error").with_cause(io);
        let source = info.source().expect("cause should be the source");
        assert_eq!(source.to_string(), "socket closed");
    }

    #[test]
    fn test_from_anyhow_keeps_message() {
        let info: ErrorInfo = anyhow::anyhow!("boom").into();
        assert_eq!(info, ErrorInfo::new("boom"));
        assert!(!info.is_not_found());
    }

    #[test]
    fn test_from_anyhow_keeps_context_chain() {
        use anyhow::Context;

        let err = Err::<(), _>(std::io::Error::other("connection reset"))
            .context("loading users")
            .unwrap_err();
        let info = ErrorInfo::from(err);
        assert_eq!(info.message, "loading users: connection reset");
    }
}
