//! Asynchronous stylesheet retrieval.

use crate::error::{BreakpointError, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use log::debug;
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("breakpoint/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        FetchResponse {
            status,
            body: body.into(),
        }
    }

    /// Only 200 and 304 count as success.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 304)
    }
}

/// Issues GET requests for stylesheet URLs.
///
/// Futures are polled on a single thread and need not be `Send`.
pub trait StylesheetFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse>>;
}

/// Fetches `http(s)://` URLs with reqwest and reads `file://` URLs from disk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(HttpFetcher { client })
    }
}

async fn fetch_file(url: Url) -> Result<FetchResponse> {
    let path = url
        .to_file_path()
        .map_err(|()| BreakpointError::InvalidUrl(url.to_string()))?;
    let body = tokio::fs::read_to_string(&path).await?;
    Ok(FetchResponse::new(200, body))
}

impl StylesheetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse>> {
        let client = self.client.clone();
        let url = url.to_string();
        async move {
            let parsed = Url::parse(&url).map_err(|_| BreakpointError::InvalidUrl(url.clone()))?;
            if parsed.scheme() == "file" {
                return fetch_file(parsed).await;
            }
            debug!("GET {}", url);
            let response = client.get(parsed).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(FetchResponse { status, body })
        }
        .boxed_local()
    }
}
