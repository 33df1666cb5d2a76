use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ParseError, Result};

/// Status, declared content type and decoded body of a GET.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Bodies without a declared type are given the benefit of the doubt.
    pub fn is_textual(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.starts_with("text/") || ct.contains("json") || ct.contains("xml")
            }
        }
    }
}

/// One HTTP GET, one attempt.
pub trait Fetch: Sync {
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<FetchResponse>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<FetchResponse> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| timeout_or(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| timeout_or(url, e))?;

        Ok(FetchResponse { status, content_type, body })
    }
}

fn timeout_or(url: &str, e: reqwest::Error) -> ParseError {
    if e.is_timeout() {
        ParseError::Timeout { url: url.to_string() }
    } else {
        ParseError::Http(e)
    }
}
