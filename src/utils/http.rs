// src/utils/http.rs

//! HTTP client utilities.

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
///
/// The client timeout doubles as the per-fetch deadline.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating transport failures and non-2xx as network errors.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    log::debug!("GET {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::network(url, format!("status code {status}")));
    }

    response.text().await.map_err(|e| AppError::network(url, e))
}
