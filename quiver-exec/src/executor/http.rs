use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct HttpRequestParts {
    pub method: String,
    pub url: url::Url,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpResponseParts {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("http error: {0}")]
    Other(String),
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(
        &self,
        req: HttpRequestParts,
        timeout: Option<Duration>,
    ) -> Result<HttpResponseParts, HttpError>;
}

pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        // Client creation should never fail in practice, but if it does, we'll
        // get a better error when trying to use it rather than panicking at
        // initialization.
        let client = reqwest::Client::builder()
            .user_agent(concat!("quiver/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                panic!("failed to create reqwest HTTP client: {e}. This is a bug - please report it.");
            });
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        timeout: Option<Duration>,
    ) -> Result<HttpResponseParts, HttpError> {
        let method: reqwest::Method = req
            .method
            .parse()
            .map_err(|e: <reqwest::Method as std::str::FromStr>::Err| {
                HttpError::Other(e.to_string())
            })?;
        let mut rb = self.client.request(method, req.url);
        if let Some(timeout) = timeout {
            rb = rb.timeout(timeout);
        }

        for (k, v) in req.headers {
            rb = rb.header(k, v);
        }
        if !req.body.is_empty() {
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(req.body);
        }

        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.to_string(), s.to_string());
            }
        }

        let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(HttpResponseParts {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        return HttpError::Timeout;
    }
    if e.is_connect() || e.is_request() {
        return HttpError::Network(e.to_string());
    }
    HttpError::Other(e.to_string())
}
