//! Shared HTTP plumbing for the service adapters.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::domain::{AppError, TransportError};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Transport(TransportError::Http(e.to_string())))
}

/// Trim a trailing slash so paths can be appended with `format!`
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Turn a non-success response into [`TransportError::Status`]
pub async fn ensure_success(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Transport(TransportError::Status {
        status: status.as_u16(),
        body,
    }))
}

pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| AppError::Transport(TransportError::Decode(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://horizon-testnet.stellar.org/"),
            "https://horizon-testnet.stellar.org"
        );
        assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(DEFAULT_HTTP_TIMEOUT).is_ok());
    }
}
