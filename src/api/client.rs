use color_eyre::eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const API_TIMEOUT: Duration = Duration::from_secs(30);
/// Error bodies are echoed into the UI; anything longer is cut.
const MAX_ERROR_BODY: usize = 300;

/// Thin JSON-over-POST client for the platform REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .wrap_err("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` as JSON and returns the raw response text.
    pub async fn post<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let mut req = self.client.post(&url).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .wrap_err_with(|| format!("Request to {url} failed"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .wrap_err("Failed to read response body")?;

        if !status.is_success() {
            return Err(eyre!("API error ({status}): {}", clip(&text, MAX_ERROR_BODY)));
        }
        Ok(text)
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
