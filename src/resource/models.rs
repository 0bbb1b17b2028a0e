//! Typed models for the Octavia, Nova, and Glance resources this tool reads.
//!
//! Each model captures the fields the report formats; the original JSON
//! payload is kept alongside (see [`Raw`]) so `--details` and the JSON output
//! can show every attribute the API returned.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A parsed resource together with the raw JSON it was parsed from.
#[derive(Debug, Clone)]
pub struct Raw<T> {
    pub item: T,
    pub attrs: Value,
}

impl<T: DeserializeOwned> Raw<T> {
    pub fn from_value(value: Value) -> Result<Self> {
        let item = serde_json::from_value(value.clone())
            .with_context(|| format!("Unexpected {} payload", std::any::type_name::<T>()))?;
        Ok(Self { item, attrs: value })
    }

    /// All attributes of the raw payload, sorted by name.
    pub fn sorted_attrs(&self) -> BTreeMap<String, Value> {
        match &self.attrs {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// `{"id": "..."}` reference entry as found in `listeners`/`members` lists.
#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vip_address: Option<String>,
    #[serde(default)]
    pub provisioning_status: String,
    #[serde(default)]
    pub operating_status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub listeners: Vec<IdRef>,
}

impl LoadBalancer {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Listener {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub protocol_port: u16,
    #[serde(default)]
    pub provisioning_status: String,
    #[serde(default)]
    pub operating_status: String,
    #[serde(default)]
    pub default_pool_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pool {
    pub id: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub lb_algorithm: String,
    #[serde(default)]
    pub provisioning_status: String,
    #[serde(default)]
    pub operating_status: String,
    // Octavia wire name; the Python SDK aliases this as health_monitor_id
    #[serde(default)]
    pub healthmonitor_id: Option<String>,
    #[serde(default)]
    pub members: Vec<IdRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthMonitor {
    pub id: String,
    #[serde(rename = "type", default)]
    pub monitor_type: String,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub expected_codes: Option<String>,
    #[serde(default)]
    pub url_path: Option<String>,
    #[serde(default)]
    pub provisioning_status: String,
    #[serde(default)]
    pub operating_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub protocol_port: u16,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub provisioning_status: String,
    #[serde(default)]
    pub operating_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amphora {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub lb_network_ip: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub compute_id: Option<String>,
}

/// Embedded flavor description of a Nova server (microversion >= 2.47 carries
/// `original_name`; older payloads only have an id).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerFlavor {
    #[serde(default)]
    pub original_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub flavor: Option<ServerFlavor>,
    #[serde(rename = "OS-EXT-SRV-ATTR:host", default)]
    pub compute_host: Option<String>,
}

impl Server {
    pub fn flavor_name(&self) -> &str {
        self.flavor
            .as_ref()
            .and_then(|f| f.original_name.as_deref())
            .unwrap_or("N/A")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_keeps_unknown_attrs() {
        let value = json!({
            "id": "lb-1",
            "name": "web",
            "vip_address": "10.0.0.5",
            "provisioning_status": "ACTIVE",
            "operating_status": "ONLINE",
            "tags": ["prod"],
            "listeners": [{"id": "ls-1"}],
            "vip_port_id": "port-9",
        });

        let raw = Raw::<LoadBalancer>::from_value(value).unwrap();
        assert_eq!(raw.item.id, "lb-1");
        assert_eq!(raw.item.listeners.len(), 1);

        let attrs = raw.sorted_attrs();
        assert!(attrs.contains_key("vip_port_id"));
        let keys: Vec<_> = attrs.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn null_name_and_missing_fields_parse() {
        let value = json!({
            "id": "ls-1",
            "name": null,
            "protocol": "HTTP",
            "protocol_port": 80,
            "provisioning_status": "ACTIVE",
            "operating_status": "ONLINE",
        });

        let raw = Raw::<Listener>::from_value(value).unwrap();
        assert!(raw.item.name.is_none());
        assert!(raw.item.default_pool_id.is_none());
    }

    #[test]
    fn server_flavor_name_falls_back() {
        let server: Server = serde_json::from_value(json!({
            "id": "srv-1",
            "flavor": {"id": "42"},
        }))
        .unwrap();
        assert_eq!(server.flavor_name(), "N/A");

        let server: Server = serde_json::from_value(json!({
            "id": "srv-2",
            "flavor": {"original_name": "m1.amphora"},
            "OS-EXT-SRV-ATTR:host": "compute-03",
        }))
        .unwrap();
        assert_eq!(server.flavor_name(), "m1.amphora");
        assert_eq!(server.compute_host.as_deref(), Some("compute-03"));
    }
}
