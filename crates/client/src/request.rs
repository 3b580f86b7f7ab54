//! Outbound request model.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: String,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            mime: None,
            data: value.into().into_bytes(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            mime: Some(mime.into()),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// Opaque binary payload; the transport chooses the content type.
    Bytes(Vec<u8>),
    Multipart(Vec<MultipartPart>),
}

impl RequestBody {
    /// Binary and multipart bodies must not carry a preset `Content-Type`:
    /// the transport sets it (with the boundary for multipart).
    pub fn is_binary(&self) -> bool {
        matches!(self, RequestBody::Bytes(_) | RequestBody::Multipart(_))
    }
}

/// A request as the application describes it, before decoration.
///
/// The `retried` flag is request-scoped and only set by the interceptor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/orders?page=2`.
    pub path: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Overrides the client's request timeout.
    pub timeout: Option<Duration>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: None,
            retried: false,
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

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn bytes(mut self, data: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes(data);
        self
    }

    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Path without query or fragment.
    pub fn route_path(&self) -> &str {
        self.path
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.path)
    }

    pub(crate) fn has_content_type(&self) -> bool {
        self.headers.contains_key(CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_path_drops_query() {
        assert_eq!(ApiRequest::get("/orders?page=2").route_path(), "/orders");
        assert_eq!(ApiRequest::get("/orders#top").route_path(), "/orders");
        assert_eq!(ApiRequest::get("/orders").route_path(), "/orders");
    }

    #[test]
    fn fresh_requests_are_not_retried() {
        let mut req = ApiRequest::post("/cart");
        assert!(!req.is_retried());
        req.mark_retried();
        assert!(req.is_retried());
    }

    #[test]
    fn binary_bodies() {
        assert!(ApiRequest::post("/upload").bytes(vec![1, 2]).body.is_binary());
        assert!(
            ApiRequest::post("/upload")
                .multipart(vec![MultipartPart::text("caption", "hi")])
                .body
                .is_binary()
        );
        assert!(!ApiRequest::get("/feed").body.is_binary());
    }
}
