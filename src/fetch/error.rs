use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;

use crate::error::ErrorInfo;

/// Raw failure of one exchange, before normalisation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never reached a server or no response came back.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP error: status={status}")]
    Http { status: StatusCode, body: Bytes },

    /// The descriptor could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Final step of the response chain: folds whatever failure is left into
/// an [`ErrorInfo`].
pub trait ErrorNormalizer: Send + Sync {
    fn normalize(&self, err: TransportError) -> ErrorInfo;
}

impl<F> ErrorNormalizer for F
where
    F: Fn(TransportError) -> ErrorInfo + Send + Sync,
{
    fn normalize(&self, err: TransportError) -> ErrorInfo {
        self(err)
    }
}

/// Prefers a `message` or `error` string from a JSON error body, and falls
/// back to `"Request failed with status code <n>"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorNormalizer;

impl ErrorNormalizer for DefaultErrorNormalizer {
    fn normalize(&self, err: TransportError) -> ErrorInfo {
        match err {
            TransportError::Network(e) => {
                let message = format!("Network Error: {e}");
                ErrorInfo::new(message).with_cause(e)
            }
            TransportError::Http { status, body } => {
                let message = body_message(&body).unwrap_or_else(|| {
                    format!("Request failed with status code {}", status.as_u16())
                });
                ErrorInfo::new(message)
                    .with_status(status.as_u16())
                    .with_cause(TransportError::Http { status, body })
            }
            TransportError::InvalidRequest(detail) => {
                ErrorInfo::new(format!("Invalid request: {detail}"))
            }
        }
    }
}

impl From<TransportError> for ErrorInfo {
    fn from(err: TransportError) -> Self {
        DefaultErrorNormalizer.normalize(err)
    }
}

fn body_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(field)?.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
