use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use crate::errors::ScrapeError;

/// Creates an HTTP client that presents itself like a regular browser
/// session to realtor.com.
pub fn create_http_client(user_agent: &str, request_timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7")
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        header::HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-cache"),
    );
    headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));
    headers.insert(
        "Upgrade-Insecure-Requests",
        header::HeaderValue::from_static("1"),
    );
    headers.insert(
        "Sec-Fetch-Dest",
        header::HeaderValue::from_static("document"),
    );
    headers.insert(
        "Sec-Fetch-Mode",
        header::HeaderValue::from_static("navigate"),
    );
    headers.insert(
        "Sec-Fetch-Site",
        header::HeaderValue::from_static("same-origin"),
    );
    headers.insert("Sec-Fetch-User", header::HeaderValue::from_static("?1"));

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .cookie_store(true)
        .timeout(request_timeout)
        .build()?;

    Ok(client)
}

/// Capability for fetching a page body over HTTP. The production
/// implementation wraps reqwest; tests substitute canned responses.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_http_client(user_agent, request_timeout)?,
        })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::debug!("Fetched {} ({})", url, status);

        response.text().await.map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
