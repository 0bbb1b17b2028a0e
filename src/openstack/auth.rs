//! Keystone Authentication
//!
//! Issues Keystone v3 tokens (password method) and caches them until shortly
//! before expiry. The service catalog returned alongside the token is used to
//! resolve the Octavia, Nova, and Glance endpoints.

use crate::config::CloudConfig;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Refresh tokens this much before they actually expire, so a token never
/// goes stale in the middle of a request.
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Fallback TTL when Keystone does not report an expiry (conservative: 30 min).
const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// One service entry from the Keystone catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogService {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// One endpoint of a catalog service.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

/// An issued token plus the catalog it came with.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub catalog: Vec<CatalogService>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Check whether this session is still usable (buffer already applied).
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Keystone credentials holder with session caching.
#[derive(Debug, Clone)]
pub struct KeystoneCredentials {
    config: CloudConfig,
    http: reqwest::Client,
    session_cache: Arc<RwLock<Option<Session>>>,
}

impl KeystoneCredentials {
    pub fn new(config: CloudConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            session_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid session, issuing a new token if the cached one expired.
    pub async fn session(&self) -> Result<Session> {
        {
            let cache = self.session_cache.read().await;
            if let Some(session) = cache.as_ref() {
                if session.is_valid() {
                    return Ok(session.clone());
                }
                tracing::debug!("Cached token expired, requesting a new one");
            }
        }

        let session = self.issue_token().await?;

        {
            let mut cache = self.session_cache.write().await;
            *cache = Some(session.clone());
        }

        Ok(session)
    }

    /// Get the current auth token for API calls.
    pub async fn token(&self) -> Result<String> {
        Ok(self.session().await?.token)
    }

    /// POST /v3/auth/tokens and parse the token header plus catalog body.
    async fn issue_token(&self) -> Result<Session> {
        let auth = &self.config.auth;
        let url = format!("{}/v3/auth/tokens", auth.auth_url.trim_end_matches('/'));
        tracing::debug!("Issuing Keystone token at {}", url);

        let body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": auth.username,
                            "domain": { "name": auth.user_domain_name },
                            "password": auth.password,
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": auth.project_name,
                        "domain": { "name": auth.project_domain_name },
                    }
                }
            }
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Keystone")?;

        let status = response.status();
        let token = response
            .headers()
            .get("x-subject-token")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse Keystone response")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Keystone authentication failed: {} (check credentials for user '{}')",
                status,
                auth.username
            ));
        }

        let token = token.ok_or_else(|| anyhow!("Keystone response missing X-Subject-Token"))?;

        let catalog: Vec<CatalogService> = payload
            .pointer("/token/catalog")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .context("Failed to parse Keystone service catalog")?
            .unwrap_or_default();

        let expires_at = payload
            .pointer("/token/expires_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc::now() + ChronoDuration::seconds(DEFAULT_TOKEN_TTL_SECS));

        let expires_at = expires_at - ChronoDuration::seconds(TOKEN_EXPIRY_BUFFER_SECS);

        tracing::debug!(
            "Token issued, valid until {} ({} catalog services)",
            expires_at,
            catalog.len()
        );

        Ok(Session {
            token,
            catalog,
            expires_at,
        })
    }
}

/// Where to get auth tokens from: a live Keystone session, or a fixed token
/// (tests and pre-authenticated environments).
#[derive(Debug, Clone)]
pub enum TokenSource {
    Keystone(KeystoneCredentials),
    Static(String),
}

impl TokenSource {
    pub async fn token(&self) -> Result<String> {
        match self {
            TokenSource::Keystone(credentials) => credentials.token().await,
            TokenSource::Static(token) => Ok(token.clone()),
        }
    }
}

/// Pick the endpoint URL for a service type from the catalog, honoring the
/// configured interface and (when set) region.
pub fn resolve_endpoint(
    catalog: &[CatalogService],
    service_type: &str,
    interface: &str,
    region: Option<&str>,
) -> Result<String> {
    let service = catalog
        .iter()
        .find(|s| s.service_type == service_type)
        .ok_or_else(|| anyhow!("Service '{}' not found in the catalog", service_type))?;

    service
        .endpoints
        .iter()
        .find(|e| {
            e.interface == interface
                && region.map_or(true, |r| e.region.as_deref() == Some(r))
        })
        .map(|e| e.url.trim_end_matches('/').to_string())
        .ok_or_else(|| {
            anyhow!(
                "No '{}' endpoint for service '{}'{}",
                interface,
                service_type,
                region.map(|r| format!(" in region '{}'", r)).unwrap_or_default()
            )
        })
}
