//! Session identifier acquisition
//!
//! One HTTP fetch plus text extraction. Failure here aborts a generation
//! cycle before any producer is spawned.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

#[async_trait]
pub trait SessionFetcher: Send + Sync {
    async fn fetch_session_id(&self) -> Result<String>;
}

pub struct HttpSessionFetcher {
    client: Client,
    url: String,
    pattern: Regex,
}

impl HttpSessionFetcher {
    pub fn new(client: Client, url: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            client,
            url: url.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    fn extract(&self, body: &str) -> Option<String> {
        self.pattern
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl SessionFetcher for HttpSessionFetcher {
    async fn fetch_session_id(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "session page request failed: {}",
                response.status()
            ));
        }
        let body = response.text().await?;

        let session_id = self
            .extract(&body)
            .ok_or_else(|| anyhow!("no session identifier found in response from {}", self.url))?;
        debug!(len = session_id.len(), "session identifier extracted");
        Ok(session_id)
    }
}
