//! Load balancer filter criteria.
//!
//! Most criteria are forwarded to Octavia as query parameters; the name
//! filter is applied client-side so that partial matches work.

use super::models::{LoadBalancer, Raw};

/// Filter criteria for the load balancer listing.
#[derive(Debug, Clone, Default)]
pub struct LbFilters {
    /// Substring match against the LB name, applied client-side.
    pub name: Option<String>,
    pub id: Option<String>,
    pub tags: Option<String>,
    pub flavor_id: Option<String>,
    pub vip_address: Option<String>,
    pub availability_zone: Option<String>,
    pub vip_network_id: Option<String>,
    pub vip_subnet_id: Option<String>,
}

impl LbFilters {
    /// Query parameters for the server-side listing. Only criteria that were
    /// actually supplied are included.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let candidates = [
            ("tags", &self.tags),
            ("availability_zone", &self.availability_zone),
            ("vip_network_id", &self.vip_network_id),
            ("vip_subnet_id", &self.vip_subnet_id),
            ("flavor_id", &self.flavor_id),
            ("vip_address", &self.vip_address),
            ("id", &self.id),
        ];

        candidates
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
            .collect()
    }

    /// Apply the client-side name substring filter.
    pub fn matches_name(&self, lb: &LoadBalancer) -> bool {
        match &self.name {
            Some(needle) => lb.display_name().contains(needle.as_str()),
            None => true,
        }
    }
}

/// Keep only the load balancers whose name contains the filter substring.
pub fn filter_by_name(lbs: Vec<Raw<LoadBalancer>>, filters: &LbFilters) -> Vec<Raw<LoadBalancer>> {
    lbs.into_iter()
        .filter(|lb| filters.matches_name(&lb.item))
        .collect()
}
