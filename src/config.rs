//! Cloud Configuration
//!
//! Resolves the connection settings for an OpenStack cloud, either from the
//! `OS_*` environment variables (`--os-cloud envvars`, the default) or from a
//! named entry in `clouds.yaml`.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Sentinel cloud name that selects environment-variable configuration.
pub const ENVVARS_CLOUD: &str = "envvars";

/// Keystone authentication settings for one cloud.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub project_name: String,
    #[serde(default = "default_domain")]
    pub user_domain_name: String,
    #[serde(default = "default_domain")]
    pub project_domain_name: String,
}

fn default_domain() -> String {
    "Default".to_string()
}

/// Connection settings for one cloud entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    pub auth: AuthConfig,
    /// Region to select from the service catalog; any region matches when unset.
    #[serde(default)]
    pub region_name: Option<String>,
    /// Endpoint interface to select from the catalog (public/internal/admin).
    #[serde(default = "default_interface")]
    pub interface: String,
}

fn default_interface() -> String {
    "public".to_string()
}

/// Top-level clouds.yaml document.
#[derive(Debug, Deserialize)]
struct CloudsFile {
    clouds: HashMap<String, CloudConfig>,
}

impl CloudConfig {
    /// Resolve the configuration for the named cloud.
    ///
    /// `envvars` reads the `OS_*` environment variables; any other name is
    /// looked up in the first clouds.yaml found on the search path.
    pub fn load(cloud: &str) -> Result<Self> {
        if cloud == ENVVARS_CLOUD {
            return Self::from_env();
        }
        Self::from_clouds_yaml(cloud)
    }

    /// Build configuration from `OS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let auth = AuthConfig {
            auth_url: require_env("OS_AUTH_URL")?,
            username: require_env("OS_USERNAME")?,
            password: require_env("OS_PASSWORD")?,
            project_name: require_env("OS_PROJECT_NAME")?,
            user_domain_name: std::env::var("OS_USER_DOMAIN_NAME")
                .unwrap_or_else(|_| default_domain()),
            project_domain_name: std::env::var("OS_PROJECT_DOMAIN_NAME")
                .unwrap_or_else(|_| default_domain()),
        };

        Ok(Self {
            auth,
            region_name: std::env::var("OS_REGION_NAME").ok(),
            interface: std::env::var("OS_INTERFACE").unwrap_or_else(|_| default_interface()),
        })
    }

    /// Look up a named cloud in clouds.yaml.
    pub fn from_clouds_yaml(cloud: &str) -> Result<Self> {
        let path = find_clouds_yaml().ok_or_else(|| {
            anyhow!("No clouds.yaml found (searched cwd, user config dir, /etc/openstack)")
        })?;

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_yaml_str(&content, cloud)
            .with_context(|| format!("Failed to load cloud '{}' from {}", cloud, path.display()))
    }

    /// Parse a clouds.yaml document and select one cloud entry.
    pub fn from_yaml_str(content: &str, cloud: &str) -> Result<Self> {
        let parsed: CloudsFile =
            serde_yaml::from_str(content).context("Invalid clouds.yaml syntax")?;

        parsed
            .clouds
            .get(cloud)
            .cloned()
            .ok_or_else(|| anyhow!("Cloud '{}' not defined in clouds.yaml", cloud))
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("Environment variable {} is not set", name))
}

/// Search the standard locations for clouds.yaml.
///
/// Order matches the OpenStack client tooling: current directory, the user
/// config dir (`~/.config/openstack`), then `/etc/openstack`.
pub fn find_clouds_yaml() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from("clouds.yaml")];

    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("openstack").join("clouds.yaml"));
    }
    candidates.push(PathBuf::from("/etc/openstack/clouds.yaml"));

    candidates.into_iter().find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
clouds:
  devstack:
    auth:
      auth_url: https://keystone.example.com:5000
      username: demo
      password: secret
      project_name: demo-project
      user_domain_name: Users
      project_domain_name: Projects
    region_name: RegionOne
    interface: internal
  minimal:
    auth:
      auth_url: https://keystone.example.com:5000
      username: admin
      password: hunter2
      project_name: admin
"#;

    #[test]
    fn parses_full_cloud_entry() {
        let config = CloudConfig::from_yaml_str(SAMPLE, "devstack").unwrap();
        assert_eq!(config.auth.auth_url, "https://keystone.example.com:5000");
        assert_eq!(config.auth.username, "demo");
        assert_eq!(config.auth.user_domain_name, "Users");
        assert_eq!(config.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(config.interface, "internal");
    }

    #[test]
    fn minimal_entry_gets_defaults() {
        let config = CloudConfig::from_yaml_str(SAMPLE, "minimal").unwrap();
        assert_eq!(config.auth.user_domain_name, "Default");
        assert_eq!(config.auth.project_domain_name, "Default");
        assert_eq!(config.interface, "public");
        assert!(config.region_name.is_none());
    }

    #[test]
    fn unknown_cloud_is_an_error() {
        let err = CloudConfig::from_yaml_str(SAMPLE, "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(CloudConfig::from_yaml_str("clouds: [", "x").is_err());
    }
}
