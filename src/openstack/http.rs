//! HTTP utilities for OpenStack REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging: truncate and strip non-printable bytes.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LOG_BODY_LENGTH)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for OpenStack API calls.
///
/// Every request carries the `X-Auth-Token` header; responses are parsed as
/// JSON and non-success statuses become errors.
#[derive(Debug, Clone)]
pub struct OsHttpClient {
    client: Client,
}

impl OsHttpClient {
    /// Create a new HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("openstack-lb-info/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Access the underlying reqwest client (token issue requests).
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Make a GET request to an OpenStack API.
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        match self.get_with_status(url, token, false).await? {
            (_, Some(value)) => Ok(value),
            (status, None) => Err(anyhow::anyhow!("API request failed: {}", status)),
        }
    }

    /// Make a GET request where 404 is an expected outcome.
    ///
    /// Returns `Ok(None)` for 404 so callers can render a missing
    /// sub-resource instead of aborting the whole report.
    pub async fn get_optional(&self, url: &str, token: &str) -> Result<Option<Value>> {
        match self.get_with_status(url, token, true).await? {
            (_, Some(value)) => Ok(Some(value)),
            (StatusCode::NOT_FOUND, None) => Ok(None),
            (status, None) => Err(anyhow::anyhow!("API request failed: {}", status)),
        }
    }

    async fn get_with_status(
        &self,
        url: &str,
        token: &str,
        not_found_expected: bool,
    ) -> Result<(StatusCode, Option<Value>)> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("X-Auth-Token", token)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only log sanitized/truncated error bodies; a 404 the caller
            // handles is not an error
            if not_found_expected && status == StatusCode::NOT_FOUND {
                tracing::debug!("API 404: {} - {}", url, sanitize_for_log(&body));
            } else {
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            }
            return Ok((status, None));
        }

        if body.is_empty() {
            return Ok((status, Some(Value::Null)));
        }

        let value = serde_json::from_str(&body).context("Failed to parse response JSON")?;
        Ok((status, Some(value)))
    }
}

/// Format an OpenStack API error for display.
///
/// Maps common HTTP statuses to actionable guidance without exposing raw API
/// error bodies.
pub fn format_os_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("401") {
        return "Authentication failed. Check your OpenStack credentials (OS_* variables or clouds.yaml)."
            .to_string();
    }
    if error_str.contains("403") {
        return "Permission denied. Check your role assignments for the load-balancer service."
            .to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "OpenStack service temporarily unavailable. Please try again.".to_string();
    }

    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated, 500 bytes total"));
        assert!(sanitized.len() < body.len());
    }

    #[test]
    fn sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("ok\x1b[31m\n"), "ok[31m");
    }

    #[test]
    fn error_mapping_is_user_friendly() {
        let err = anyhow::anyhow!("API request failed: 401 Unauthorized");
        assert!(format_os_error(&err).contains("Authentication failed"));

        let err = anyhow::anyhow!("API request failed: 429 Too Many Requests");
        assert!(format_os_error(&err).contains("Rate limit"));

        let err = anyhow::anyhow!("API request failed: 503 Service Unavailable");
        assert!(format_os_error(&err).contains("temporarily unavailable"));
    }
}
