//! HTTP transport seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::request::{ApiRequest, MultipartPart, RequestBody};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("server unreachable: {0}")]
    Offline(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Offline(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn json_body(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as JSON, or `Null` when it is empty or not JSON.
    pub fn json_value(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Executes one decorated request. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, req: &ApiRequest, timeout: Duration) -> Result<ApiResponse, TransportError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

// Rebuilt per attempt: a Form is consumed when sent.
fn multipart_form(parts: &[MultipartPart]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for p in parts {
        let mut part = Part::bytes(p.data.clone());
        if let Some(file_name) = &p.file_name {
            part = part.file_name(file_name.clone());
        }
        if let Some(mime) = &p.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| TransportError::Network(format!("invalid mime for part {}: {e}", p.name)))?;
        }
        form = form.part(p.name.clone(), part);
    }
    Ok(form)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, req: &ApiRequest, timeout: Duration) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .http
            .request(req.method.clone(), self.url(&req.path))
            .headers(req.headers.clone())
            .timeout(timeout);

        builder = match &req.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Bytes(data) => builder.body(data.clone()),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let res = builder.send().await?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?.to_vec();

        Ok(ApiResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths() {
        let t = ReqwestTransport::new("http://localhost:8080/");
        assert_eq!(t.url("/orders"), "http://localhost:8080/orders");
        assert_eq!(t.url("orders"), "http://localhost:8080/orders");
    }

    #[test]
    fn json_value_tolerates_garbage() {
        let res = ApiResponse::new(StatusCode::OK, "<html>");
        assert!(res.json_value().is_null());
    }
}
