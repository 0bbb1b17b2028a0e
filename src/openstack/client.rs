//! OpenStack Client
//!
//! Main client for querying load balancer resources, combining Keystone
//! authentication, catalog endpoint resolution, and HTTP functionality.

use super::auth::{resolve_endpoint, KeystoneCredentials, TokenSource};
use super::http::OsHttpClient;
use crate::config::CloudConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Service endpoints resolved from the Keystone catalog.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    /// Octavia (service type `load-balancer`)
    pub load_balancer: String,
    /// Nova (service type `compute`), catalog URL usually versioned (…/v2.1)
    pub compute: String,
    /// Glance (service type `image`), unversioned catalog URL
    pub image: String,
}

/// Main OpenStack client.
#[derive(Debug, Clone)]
pub struct OsClient {
    token: TokenSource,
    pub http: OsHttpClient,
    pub endpoints: ServiceEndpoints,
}

impl OsClient {
    /// Authenticate against Keystone and resolve the service endpoints.
    pub async fn connect(config: CloudConfig) -> Result<Self> {
        let http = OsHttpClient::new()?;
        let credentials = KeystoneCredentials::new(config.clone(), http.inner().clone());

        let session = credentials
            .session()
            .await
            .context("Failed to authenticate with Keystone")?;

        let region = config.region_name.as_deref();
        let interface = config.interface.as_str();
        let endpoints = ServiceEndpoints {
            load_balancer: resolve_endpoint(&session.catalog, "load-balancer", interface, region)?,
            compute: resolve_endpoint(&session.catalog, "compute", interface, region)?,
            image: resolve_endpoint(&session.catalog, "image", interface, region)?,
        };

        tracing::debug!("Resolved endpoints: {:?}", endpoints);

        Ok(Self {
            token: TokenSource::Keystone(credentials),
            http,
            endpoints,
        })
    }

    /// Build a client from known endpoints and a fixed token, skipping
    /// Keystone entirely. Used by the integration tests.
    pub fn with_endpoints(endpoints: ServiceEndpoints, token: &str) -> Result<Self> {
        Ok(Self {
            token: TokenSource::Static(token.to_string()),
            http: OsHttpClient::new()?,
            endpoints,
        })
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build an Octavia LBaaS v2 URL
    pub fn lbaas_url(&self, path: &str) -> String {
        format!("{}/v2.0/lbaas/{}", self.endpoints.load_balancer, path)
    }

    /// Build an Octavia-specific (non-LBaaS) URL, e.g. amphorae
    pub fn octavia_url(&self, path: &str) -> String {
        format!("{}/v2.0/octavia/{}", self.endpoints.load_balancer, path)
    }

    /// Build a Nova compute URL
    pub fn compute_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.compute, path)
    }

    /// Build a Glance image URL
    pub fn image_url(&self, path: &str) -> String {
        format!("{}/v2/images/{}", self.endpoints.image, path)
    }

    // =========================================================================
    // Load balancer retrieval
    // =========================================================================

    /// List load balancers matching the given query criteria, following
    /// pagination links until exhausted.
    pub async fn list_load_balancers(&self, query: &[(String, String)]) -> Result<Vec<Value>> {
        let mut url = Url::parse(&self.lbaas_url("loadbalancers"))
            .context("Invalid load balancer endpoint URL")?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        self.list_paginated(url.to_string(), "loadbalancers").await
    }

    /// Retrieve a listener by ID, or `None` if it no longer exists.
    pub async fn find_listener(&self, listener_id: &str) -> Result<Option<Value>> {
        tracing::debug!("Retrieving listener with ID: {}", listener_id);
        self.get_wrapped_optional(&self.lbaas_url(&format!("listeners/{}", listener_id)), "listener")
            .await
    }

    /// Retrieve a pool by ID, or `None` if it no longer exists.
    pub async fn find_pool(&self, pool_id: &str) -> Result<Option<Value>> {
        tracing::debug!("Retrieving pool with ID: {}", pool_id);
        self.get_wrapped_optional(&self.lbaas_url(&format!("pools/{}", pool_id)), "pool")
            .await
    }

    /// Retrieve a health monitor by ID, or `None` if it no longer exists.
    pub async fn find_health_monitor(&self, health_monitor_id: &str) -> Result<Option<Value>> {
        tracing::debug!("Retrieving health monitor with ID: {}", health_monitor_id);
        self.get_wrapped_optional(
            &self.lbaas_url(&format!("healthmonitors/{}", health_monitor_id)),
            "healthmonitor",
        )
        .await
    }

    /// Retrieve a pool member by ID, or `None` if it no longer exists.
    pub async fn find_member(&self, pool_id: &str, member_id: &str) -> Result<Option<Value>> {
        tracing::debug!(
            "Retrieving member with ID: {} from pool ID: {}",
            member_id,
            pool_id
        );
        self.get_wrapped_optional(
            &self.lbaas_url(&format!("pools/{}/members/{}", pool_id, member_id)),
            "member",
        )
        .await
    }

    /// List the amphorae associated with a load balancer.
    pub async fn list_amphorae(&self, loadbalancer_id: &str) -> Result<Vec<Value>> {
        tracing::debug!("Retrieving amphorae for LB ID: {}", loadbalancer_id);
        let mut url =
            Url::parse(&self.octavia_url("amphorae")).context("Invalid Octavia endpoint URL")?;
        url.query_pairs_mut()
            .append_pair("loadbalancer_id", loadbalancer_id);

        self.list_paginated(url.to_string(), "amphorae").await
    }

    /// Retrieve a compute server by ID, or `None` if it no longer exists.
    pub async fn find_server(&self, server_id: &str) -> Result<Option<Value>> {
        tracing::debug!("Retrieving compute server with ID: {}", server_id);
        self.get_wrapped_optional(&self.compute_url(&format!("servers/{}", server_id)), "server")
            .await
    }

    /// Retrieve an image by ID, or `None` if it no longer exists.
    pub async fn find_image(&self, image_id: &str) -> Result<Option<Value>> {
        tracing::debug!("Retrieving image with ID: {}", image_id);
        let token = self.token.token().await?;
        self.http.get_optional(&self.image_url(image_id), &token).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// GET an endpoint whose 200 body wraps the object in a single key,
    /// e.g. `{"listener": {...}}`, unwrapping that key.
    async fn get_wrapped_optional(&self, url: &str, key: &str) -> Result<Option<Value>> {
        let token = self.token.token().await?;
        let Some(body) = self.http.get_optional(url, &token).await? else {
            return Ok(None);
        };

        match body.get(key) {
            Some(inner) => Ok(Some(inner.clone())),
            // Some deployments return the bare object without the wrapper
            None => Ok(Some(body)),
        }
    }

    /// Collect all pages of a list endpoint by following the
    /// `<collection>_links` entry with `rel == "next"`.
    async fn list_paginated(&self, first_url: String, collection: &str) -> Result<Vec<Value>> {
        let links_key = format!("{}_links", collection);
        let mut items = Vec::new();
        let mut next = Some(first_url);

        while let Some(url) = next.take() {
            let token = self.token.token().await?;
            let page = self.http.get(&url, &token).await?;

            if let Some(page_items) = page.get(collection).and_then(|v| v.as_array()) {
                items.extend(page_items.iter().cloned());
            }

            next = page
                .get(&links_key)
                .and_then(|v| v.as_array())
                .and_then(|links| {
                    links.iter().find(|l| {
                        l.get("rel").and_then(|r| r.as_str()) == Some("next")
                    })
                })
                .and_then(|l| l.get("href"))
                .and_then(|h| h.as_str())
                .map(|s| s.to_string());
        }

        Ok(items)
    }
}
