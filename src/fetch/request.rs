use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use super::error::TransportError;

/// One outbound call: method, path relative to the base URL, optional JSON
/// body, query pairs and per-request headers.
///
/// Descriptors are consumed by [`ApiClient::request`](super::ApiClient::request);
/// request interceptors receive and return them by value.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Serialises `body` as the JSON payload.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body)
            .map_err(|e| TransportError::InvalidRequest(format!("body is not JSON: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders_set_method_and_path() {
        assert_eq!(RequestDescriptor::get("/users").method, Method::GET);
        assert_eq!(RequestDescriptor::post("/users").method, Method::POST);
        assert_eq!(RequestDescriptor::put("/users/1").method, Method::PUT);
        let del = RequestDescriptor::delete("/users/1");
        assert_eq!(del.method, Method::DELETE);
        assert_eq!(del.path, "/users/1");
        assert!(del.body.is_none());
    }

    #[test]
    fn test_json_and_query() {
        let req = RequestDescriptor::post("/users")
            .json(&json!({"name": "Ada"}))
            .unwrap()
            .query("page", "2")
            .query("limit", "10");

        assert_eq!(req.body, Some(json!({"name": "Ada"})));
        assert_eq!(
            req.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
    }
}
