use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use tracing::warn;

use super::token::TokenProvider;
use crate::fetch::interceptor::RequestInterceptor;
use crate::fetch::request::RequestDescriptor;

/// A [`RequestInterceptor`] that writes the provider's token into a header.
///
/// By default this is `Authorization: Bearer <token>`. When the provider has
/// no token the request goes out unchanged.
pub struct BearerAuth<P> {
    pub provider: P,
    pub header_name: HeaderName,
    pub scheme: Option<String>,
}

impl<P> BearerAuth<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            header_name: AUTHORIZATION,
            scheme: Some("Bearer".to_string()),
        }
    }

    /// Sends the raw token under `header_name`, with no scheme prefix
    /// (e.g. `X-Api-Key`).
    pub fn raw_header(provider: P, header_name: HeaderName) -> Self {
        Self {
            provider,
            header_name,
            scheme: None,
        }
    }
}

impl<P: TokenProvider> RequestInterceptor for BearerAuth<P> {
    fn intercept(&self, mut req: RequestDescriptor) -> RequestDescriptor {
        let Some(token) = self.provider.token() else {
            return req;
        };
        let value = match &self.scheme {
            Some(scheme) => format!("{scheme} {token}"),
            None => token,
        };
        match HeaderValue::from_str(&value) {
            Ok(mut value) => {
                value.set_sensitive(true);
                req.headers.insert(self.header_name.clone(), value);
            }
            Err(_) => warn!(header = %self.header_name, "Token is not a valid header value, sending without it"),
        }
        req
    }
}
