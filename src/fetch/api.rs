use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::basic::{BasicClient, DEFAULT_TIMEOUT};
use super::client::HttpClient;
use super::error::{DefaultErrorNormalizer, ErrorNormalizer, TransportError};
use super::interceptor::{ExchangeResult, RequestInterceptor, ResponseInterceptor};
use super::request::RequestDescriptor;
use super::response::ApiResponse;
use crate::error::ErrorInfo;

/// Base URL and headers sent with every request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_headers: HeaderMap,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: default_headers(),
        }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Single point of configuration for calls to one backend.
///
/// Each call runs: request interceptors, transport, response interceptors,
/// then the error normaliser, so callers only ever see [`ErrorInfo`].
pub struct ApiClient<C = BasicClient> {
    transport: C,
    config: RwLock<Arc<ClientConfig>>,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
    normalizer: Box<dyn ErrorNormalizer>,
    timeout: Option<Duration>,
}

impl ApiClient<BasicClient> {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder<BasicClient> {
        ApiClientBuilder::new(base_url)
    }
}

impl<C: HttpClient> ApiClient<C> {
    /// Replaces the base URL and default headers. Last call wins; requests
    /// already in flight keep the configuration they started with.
    pub fn configure(&self, base_url: impl Into<String>, default_headers: HeaderMap) {
        let next = Arc::new(ClientConfig {
            base_url: base_url.into(),
            default_headers,
        });
        let mut config = self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *config = next;
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Issues one exchange and returns the 2xx response, or the normalised error.
    #[tracing::instrument(skip(self, descriptor), fields(method = %descriptor.method, path = %descriptor.path))]
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, ErrorInfo> {
        let descriptor = self
            .request_interceptors
            .iter()
            .fold(descriptor, |req, interceptor| interceptor.intercept(req));

        let outcome = self.exchange(descriptor).await;

        let outcome = self
            .response_interceptors
            .iter()
            .fold(outcome, |outcome, interceptor| interceptor.intercept(outcome));

        outcome.map_err(|err| {
            let info = self.normalizer.normalize(err);
            warn!(error = %info, "Request failed");
            info
        })
    }

    /// [`request`](Self::request) followed by JSON decoding of the body.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ErrorInfo> {
        let resp = self.request(descriptor).await?;
        resp.json().map_err(|e| {
            ErrorInfo::new(format!("Invalid response body: {e}"))
                .with_status(resp.status.as_u16())
                .with_cause(e)
        })
    }

    async fn exchange(&self, descriptor: RequestDescriptor) -> ExchangeResult {
        let req = self.build_request(descriptor)?;
        debug!(url = %req.url(), "Sending request");

        let resp = self.transport.execute(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::Http { status, body });
        }
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    fn build_request(&self, descriptor: RequestDescriptor) -> Result<reqwest::Request, TransportError> {
        let config = self.config();
        let raw = join_url(&config.base_url, &descriptor.path);
        let mut url = reqwest::Url::parse(&raw)
            .map_err(|e| TransportError::InvalidRequest(format!("{raw}: {e}")))?;
        if !descriptor.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &descriptor.query {
                pairs.append_pair(key, value);
            }
        }

        let mut req = reqwest::Request::new(descriptor.method, url);
        let headers = req.headers_mut();
        headers.extend(config.default_headers.clone());
        headers.extend(descriptor.headers);

        if let Some(body) = descriptor.body {
            let bytes = serde_json::to_vec(&body)
                .map_err(|e| TransportError::InvalidRequest(format!("body is not JSON: {e}")))?;
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *req.body_mut() = Some(bytes.into());
        }

        if let Some(timeout) = self.timeout {
            *req.timeout_mut() = Some(timeout);
        }
        Ok(req)
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Collects interceptors and settings for an [`ApiClient`].
pub struct ApiClientBuilder<C> {
    transport: C,
    config: ClientConfig,
    request_interceptors: Vec<Box<dyn RequestInterceptor>>,
    response_interceptors: Vec<Box<dyn ResponseInterceptor>>,
    normalizer: Box<dyn ErrorNormalizer>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder<BasicClient> {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            transport: BasicClient::from(reqwest::Client::new()),
            config: ClientConfig::new(base_url),
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            normalizer: Box::new(DefaultErrorNormalizer),
            // `reqwest::Client::new()` has no timeout; bound each request instead.
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl<C: HttpClient> ApiClientBuilder<C> {
    /// Swaps the transport, keeping everything else.
    pub fn transport<T: HttpClient>(self, transport: T) -> ApiClientBuilder<T> {
        ApiClientBuilder {
            transport,
            config: self.config,
            request_interceptors: self.request_interceptors,
            response_interceptors: self.response_interceptors,
            normalizer: self.normalizer,
            timeout: self.timeout,
        }
    }

    pub fn default_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.config.default_headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request_interceptors.push(Box::new(interceptor));
        self
    }

    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response_interceptors.push(Box::new(interceptor));
        self
    }

    pub fn error_normalizer(mut self, normalizer: impl ErrorNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn build(self) -> ApiClient<C> {
        ApiClient {
            transport: self.transport,
            config: RwLock::new(Arc::new(self.config)),
            request_interceptors: self.request_interceptors,
            response_interceptors: self.response_interceptors,
            normalizer: self.normalizer,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::Method;
    use reqwest::header::{AUTHORIZATION, HeaderName};
    use std::sync::Mutex;

    /// Records the last request and answers with a canned response.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Option<(Method, String, HeaderMap, Option<Vec<u8>>)>>,
    }

    #[async_trait]
    impl HttpClient for Arc<Recorder> {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let body = req.body().and_then(|b| b.as_bytes()).map(<[u8]>::to_vec);
            *self.seen.lock().unwrap() = Some((
                req.method().clone(),
                req.url().to_string(),
                req.headers().clone(),
                body,
            ));
            let resp = http_response(200, r#"{"ok":true}"#);
            Ok(reqwest::Response::from(resp))
        }
    }

    fn http_response(status: u16, body: &'static str) -> http::Response<&'static str> {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
    }

    fn client_with(recorder: &Arc<Recorder>) -> ApiClientBuilder<Arc<Recorder>> {
        ApiClient::builder("http://api.test/v1/").transport(recorder.clone())
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/v1/", "/users"), "http://a/v1/users");
        assert_eq!(join_url("http://a/v1", "users"), "http://a/v1/users");
        assert_eq!(join_url("http://a", ""), "http://a");
    }

    #[test]
    fn test_default_builder_bounds_requests() {
        let client = ApiClient::builder("http://api.test").build();
        assert_eq!(client.timeout, Some(DEFAULT_TIMEOUT));

        let req = client.build_request(RequestDescriptor::get("/users")).unwrap();
        assert_eq!(req.timeout(), Some(&DEFAULT_TIMEOUT));

        let shorter = ApiClient::builder("http://api.test")
            .timeout(Duration::from_secs(2))
            .build();
        let req = shorter.build_request(RequestDescriptor::get("/users")).unwrap();
        assert_eq!(req.timeout(), Some(&Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_request_builds_url_query_and_body() {
        let recorder = Arc::new(Recorder::default());
        let client = client_with(&recorder).build();

        let req = RequestDescriptor::post("/users")
            .query("notify", "true")
            .json(&serde_json::json!({"name": "Ada"}))
            .unwrap();
        let resp = client.request(req).await.unwrap();
        assert_eq!(resp.status, 200);

        let (method, url, headers, body) = recorder.seen.lock().unwrap().take().unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(url, "http://api.test/v1/users?notify=true");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(body.unwrap(), br#"{"name":"Ada"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_interceptors_run_in_registration_order() {
        let recorder = Arc::new(Recorder::default());
        let tag = HeaderName::from_static("x-order");
        let first = tag.clone();
        let second = tag.clone();
        let client = client_with(&recorder)
            .request_interceptor(move |req: RequestDescriptor| {
                req.header(first.clone(), HeaderValue::from_static("first"))
            })
            .request_interceptor(move |mut req: RequestDescriptor| {
                let prev = req.headers.get(&second).cloned();
                assert_eq!(prev.unwrap(), "first");
                req.headers.insert(second.clone(), HeaderValue::from_static("second"));
                req
            })
            .build();

        client.request(RequestDescriptor::get("/users")).await.unwrap();

        let (_, _, headers, _) = recorder.seen.lock().unwrap().take().unwrap();
        assert_eq!(headers.get(&tag).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_descriptor_headers_override_defaults() {
        let recorder = Arc::new(Recorder::default());
        let client = client_with(&recorder)
            .default_header(AUTHORIZATION, HeaderValue::from_static("Bearer default"))
            .build();

        let req = RequestDescriptor::get("/users")
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer override"));
        client.request(req).await.unwrap();

        let (_, _, headers, _) = recorder.seen.lock().unwrap().take().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer override");
    }

    #[tokio::test]
    async fn test_configure_last_write_wins() {
        let recorder = Arc::new(Recorder::default());
        let client = client_with(&recorder).build();

        client.configure("http://first.test", HeaderMap::new());
        let mut headers = HeaderMap::new();
        headers.insert("x-env", HeaderValue::from_static("staging"));
        client.configure("http://second.test/api", headers);

        client.request(RequestDescriptor::get("/users")).await.unwrap();

        let (_, url, headers, _) = recorder.seen.lock().unwrap().take().unwrap();
        assert_eq!(url, "http://second.test/api/users");
        assert_eq!(headers.get("x-env").unwrap(), "staging");
        assert_eq!(client.config().base_url, "http://second.test/api");
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_normalised() {
        let recorder = Arc::new(Recorder::default());
        let client = client_with(&recorder).build();
        client.configure("not a url", HeaderMap::new());

        let err = client.request(RequestDescriptor::get("/users")).await.unwrap_err();
        assert!(err.message.starts_with("Invalid request:"));
        assert_eq!(err.status_code, None);
        assert!(recorder.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_custom_normalizer_replaces_default() {
        let recorder = Arc::new(Recorder::default());
        let client = client_with(&recorder)
            .response_interceptor(|_: ExchangeResult| -> ExchangeResult {
                Err(TransportError::InvalidRequest("forced".into()))
            })
            .error_normalizer(|_: TransportError| ErrorInfo::new("normalised"))
            .build();

        let err = client.request(RequestDescriptor::get("/users")).await.unwrap_err();
        assert_eq!(err, ErrorInfo::new("normalised"));
    }

    #[tokio::test]
    async fn test_request_json_decode_failure_keeps_status() {
        let recorder = Arc::new(Recorder::default());
        let client = client_with(&recorder).build();

        let err = client
            .request_json::<Vec<String>>(RequestDescriptor::get("/users"))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("Invalid response body:"));
        assert_eq!(err.status_code, Some(200));
    }
}
