//! The HTTP seam between the explorer client and the network.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use chainverify_core::VerifyError;

/// Minimal JSON-over-HTTP interface used by [`crate::ExplorerClient`].
///
/// The trait is object-safe and is stored as `Arc<dyn HttpFetch>`, which lets
/// tests substitute canned responses.
#[async_trait]
pub trait HttpFetch: Send + Sync + 'static {
    /// `GET url` and parse the body as JSON.
    async fn get_json(&self, url: &Url) -> Result<Value, VerifyError>;

    /// `POST url` with a JSON body and parse the response as JSON.
    async fn post_json(&self, url: &Url, body: &Value) -> Result<Value, VerifyError>;
}

/// [`HttpFetch`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    http: reqwest::Client,
}

impl ReqwestFetch {
    /// Build a client; `timeout` of `None` means requests may wait forever.
    pub fn new(timeout: Option<Duration>) -> Result<Self, VerifyError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| VerifyError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, VerifyError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(VerifyError::Http(format!("HTTP {status}: {body}")));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get_json(&self, url: &Url) -> Result<Value, VerifyError> {
        let resp = self
            .http
            .get(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }

    async fn post_json(&self, url: &Url, body: &Value) -> Result<Value, VerifyError> {
        let resp = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| VerifyError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }
}
