use crate::config::UpdateConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::warn;

/// Transport for downloading filter-list text.
#[async_trait]
pub trait FilterFetcher: Send + Sync {
    /// Network errors and non-success responses both map to `Err`.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UpdateConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FilterFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let stream = resp
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other));
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        // Undecodable bytes become U+FFFD and only spoil the lines holding them
        let text = String::from_utf8(body).unwrap_or_else(|e| {
            warn!("List at {} is not valid UTF-8, decoding lossily", url);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        });
        Ok(text)
    }
}
