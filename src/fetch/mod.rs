//! HTTP client wrapper for one REST backend.
//!
//! [`ApiClient`] owns the base URL, default headers, interceptor chains and
//! error normaliser; [`HttpClient`] is the transport underneath it.

mod api;
mod basic;
mod client;
mod error;
mod interceptor;
mod request;
mod response;
pub mod auth;

pub use api::{ApiClient, ApiClientBuilder, ClientConfig};
pub use basic::{BasicClient, DEFAULT_TIMEOUT};
pub use client::HttpClient;
pub use error::{DefaultErrorNormalizer, ErrorNormalizer, TransportError};
pub use interceptor::{ExchangeResult, LogResponses, RequestInterceptor, ResponseInterceptor};
pub use request::RequestDescriptor;
pub use response::ApiResponse;
