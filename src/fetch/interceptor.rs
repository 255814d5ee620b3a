use tracing::{debug, warn};

use super::error::TransportError;
use super::request::RequestDescriptor;
use super::response::ApiResponse;

/// Outcome of one exchange as seen by response interceptors.
pub type ExchangeResult = Result<ApiResponse, TransportError>;

/// Transform applied to every outgoing request, in registration order.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, req: RequestDescriptor) -> RequestDescriptor;
}

impl<F> RequestInterceptor for F
where
    F: Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync,
{
    fn intercept(&self, req: RequestDescriptor) -> RequestDescriptor {
        self(req)
    }
}

/// Transform applied to every exchange outcome, in registration order,
/// before the error normaliser runs.
pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, outcome: ExchangeResult) -> ExchangeResult;
}

impl<F> ResponseInterceptor for F
where
    F: Fn(ExchangeResult) -> ExchangeResult + Send + Sync,
{
    fn intercept(&self, outcome: ExchangeResult) -> ExchangeResult {
        self(outcome)
    }
}

/// Logs each outcome and passes it through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogResponses;

impl ResponseInterceptor for LogResponses {
    fn intercept(&self, outcome: ExchangeResult) -> ExchangeResult {
        match &outcome {
            Ok(resp) => debug!(status = %resp.status, bytes = resp.body.len(), "Response received"),
            Err(TransportError::Http { status, .. }) => warn!(%status, "Server returned an error status"),
            Err(e) => warn!(error = %e, "Exchange failed"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;

    #[test]
    fn test_closure_request_interceptor() {
        let add_page = |req: RequestDescriptor| req.query("page", "1");
        let req = RequestInterceptor::intercept(&add_page, RequestDescriptor::get("/users"));
        assert_eq!(req.query, vec![("page".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_closure_response_interceptor_can_rewrite_outcome() {
        // Treat 404 on a collection as an empty list.
        let empty_on_404 = |outcome: ExchangeResult| match outcome {
            Err(TransportError::Http { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(ApiResponse {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: Bytes::from_static(b"[]"),
                })
            }
            other => other,
        };

        let outcome = ResponseInterceptor::intercept(
            &empty_on_404,
            Err(TransportError::Http {
                status: StatusCode::NOT_FOUND,
                body: Bytes::new(),
            }),
        );
        let resp = outcome.unwrap();
        assert_eq!(resp.json::<Vec<u32>>().unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_log_responses_passes_through() {
        let outcome = LogResponses.intercept(Err(TransportError::InvalidRequest("x".into())));
        assert!(matches!(outcome, Err(TransportError::InvalidRequest(_))));
    }
}
