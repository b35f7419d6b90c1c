use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, Response};

pub fn build_client<C: ConfigProvider>(config: &C) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent())
        .build()
        .map_err(|e| EtlError::ConfigError {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// GET that treats transport failures, timeouts and non-2xx statuses alike as `FetchError`.
pub async fn get(client: &Client, url: &str) -> Result<Response> {
    tracing::debug!("GET {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            EtlError::fetch(url, "request timed out")
        } else {
            EtlError::fetch(url, e)
        }
    })?;

    let status = response.status();
    tracing::debug!("Response status: {}", status);

    if !status.is_success() {
        return Err(EtlError::fetch(url, format!("HTTP {}", status)));
    }

    Ok(response)
}

pub async fn get_text(client: &Client, url: &str) -> Result<String> {
    get(client, url)
        .await?
        .text()
        .await
        .map_err(|e| EtlError::fetch(url, format!("Failed to read response body: {}", e)))
}
