use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam under [`ApiClient`](super::ApiClient).
///
/// Anything that can turn a fully built `reqwest::Request` into a response
/// can sit here, which is how tests swap in recording or failing transports.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
