use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::error::TransportError;
use crate::logging::log_transport_error;

/// Uniform JSON GET/POST. No retries and no timeout: the caller owns recovery.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError>;
    async fn post_json(&self, url: &Url, body: &Value) -> Result<Value, TransportError>;
}

/// Join `base` and `path` and append query pairs.
pub fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let parsed = if query.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, query)
    };
    parsed.map_err(|e| TransportError::InvalidUrl {
        url: raw,
        reason: e.to_string(),
    })
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

async fn parse_response(url: &Url, response: Response) -> Result<Value, TransportError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;

    if !status.is_success() {
        let err = TransportError::Status {
            status: status.as_u16(),
            body: text,
        };
        log_transport_error(url.path(), &err);
        return Err(err);
    }
    serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                let err = TransportError::Network(e.to_string());
                log_transport_error(url.path(), &err);
                err
            })?;
        parse_response(url, response).await
    }

    async fn post_json(&self, url: &Url, body: &Value) -> Result<Value, TransportError> {
        // `.json` always sends a body and the JSON content type, even for `{}`.
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let err = TransportError::Network(e.to_string());
                log_transport_error(url.path(), &err);
                err
            })?;
        parse_response(url, response).await
    }
}
