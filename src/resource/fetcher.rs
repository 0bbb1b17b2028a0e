//! Report assembly
//!
//! Walks the sub-resource graph of each load balancer (listeners, pools,
//! health monitors, members, amphorae) and assembles the per-LB report that
//! the output formatters render. Member detail fetches fan out over a bounded
//! number of concurrent requests; everything else is sequential.

use super::filter::{filter_by_name, LbFilters};
use super::models::{Amphora, HealthMonitor, Listener, LoadBalancer, Member, Pool, Raw, Server};
use crate::openstack::client::OsClient;
use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;

/// Knobs that shape report assembly, from the command line.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Include every raw attribute of each resource.
    pub details: bool,
    /// Skip pool member lookups entirely.
    pub no_members: bool,
    /// Concurrent member detail fetches per pool.
    pub max_workers: usize,
}

/// Full report for one load balancer (`--type lb`).
#[derive(Debug, Clone)]
pub struct LbReport {
    pub lb: Raw<LoadBalancer>,
    pub listeners: Vec<ListenerReport>,
}

#[derive(Debug, Clone)]
pub struct ListenerReport {
    /// The referenced listener, or `None` if it vanished between the LB
    /// listing and the detail fetch.
    pub listener: Option<Raw<Listener>>,
    pub pool: Option<PoolReport>,
}

#[derive(Debug, Clone)]
pub struct PoolReport {
    pub pool: Raw<Pool>,
    pub health_monitor: Option<Raw<HealthMonitor>>,
    /// `None` when member fetching was disabled (`--no-members`).
    pub members: Option<Vec<MemberReport>>,
}

#[derive(Debug, Clone)]
pub struct MemberReport {
    pub id: String,
    pub member: Option<Raw<Member>>,
}

/// Amphora report for one load balancer (`--type amphora`).
#[derive(Debug, Clone)]
pub struct AmphoraReport {
    pub lb: Raw<LoadBalancer>,
    pub amphorae: Vec<AmphoraEntry>,
}

#[derive(Debug, Clone)]
pub struct AmphoraEntry {
    pub amphora: Raw<Amphora>,
    pub server: Option<Raw<Server>>,
    pub image_name: Option<String>,
}

/// Query load balancers with the given criteria and apply the client-side
/// name filter.
pub async fn query_load_balancers(
    client: &OsClient,
    filters: &LbFilters,
) -> Result<Vec<Raw<LoadBalancer>>> {
    let query = filters.query_pairs();
    tracing::debug!("Retrieving load balancers with filters: {:?}", query);

    let values = client.list_load_balancers(&query).await?;

    let mut lbs = Vec::with_capacity(values.len());
    for value in values {
        lbs.push(Raw::<LoadBalancer>::from_value(value)?);
    }

    Ok(filter_by_name(lbs, filters))
}

/// Assembles per-LB reports, caching image names across calls.
pub struct ReportBuilder {
    client: OsClient,
    options: ReportOptions,
    image_names: HashMap<String, String>,
}

impl ReportBuilder {
    pub fn new(client: OsClient, options: ReportOptions) -> Self {
        Self {
            client,
            options,
            image_names: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Build the listener/pool/member report for one load balancer.
    pub async fn lb_report(&self, lb: Raw<LoadBalancer>) -> Result<LbReport> {
        let mut listeners = Vec::with_capacity(lb.item.listeners.len());

        for listener_ref in &lb.item.listeners {
            listeners.push(self.listener_report(&listener_ref.id).await?);
        }

        Ok(LbReport { lb, listeners })
    }

    async fn listener_report(&self, listener_id: &str) -> Result<ListenerReport> {
        let Some(value) = self.client.find_listener(listener_id).await? else {
            tracing::warn!("Listener {} no longer exists", listener_id);
            return Ok(ListenerReport {
                listener: None,
                pool: None,
            });
        };
        let listener = Raw::<Listener>::from_value(value)?;

        let pool = match listener.item.default_pool_id.as_deref() {
            Some(pool_id) => self.pool_report(pool_id).await?,
            None => None,
        };

        Ok(ListenerReport {
            listener: Some(listener),
            pool,
        })
    }

    async fn pool_report(&self, pool_id: &str) -> Result<Option<PoolReport>> {
        let Some(value) = self.client.find_pool(pool_id).await? else {
            tracing::warn!("Pool {} no longer exists", pool_id);
            return Ok(None);
        };
        let pool = Raw::<Pool>::from_value(value)?;

        let health_monitor = match pool.item.healthmonitor_id.as_deref() {
            Some(monitor_id) => self
                .client
                .find_health_monitor(monitor_id)
                .await?
                .map(Raw::<HealthMonitor>::from_value)
                .transpose()?,
            None => None,
        };

        let members = if self.options.no_members {
            None
        } else {
            let member_ids: Vec<String> =
                pool.item.members.iter().map(|m| m.id.clone()).collect();
            Some(self.member_reports(&pool.item.id, member_ids).await?)
        };

        Ok(Some(PoolReport {
            pool,
            health_monitor,
            members,
        }))
    }

    /// Fetch member details with bounded concurrency, preserving the order of
    /// the pool's member list.
    async fn member_reports(
        &self,
        pool_id: &str,
        member_ids: Vec<String>,
    ) -> Result<Vec<MemberReport>> {
        let workers = self.options.max_workers.max(1);
        tracing::debug!(
            "Fetching {} member(s) of pool {} with {} worker(s)",
            member_ids.len(),
            pool_id,
            workers
        );

        stream::iter(member_ids)
            .map(|member_id| {
                let client = self.client.clone();
                let pool_id = pool_id.to_string();
                async move {
                    let member = client
                        .find_member(&pool_id, &member_id)
                        .await?
                        .map(Raw::<Member>::from_value)
                        .transpose()?;
                    if member.is_none() {
                        tracing::warn!("Member {} no longer exists", member_id);
                    }
                    Ok::<_, anyhow::Error>(MemberReport {
                        id: member_id,
                        member,
                    })
                }
            })
            .buffered(workers)
            .try_collect()
            .await
    }

    /// Build the amphora report for one load balancer.
    pub async fn amphora_report(&mut self, lb: Raw<LoadBalancer>) -> Result<AmphoraReport> {
        let values = self.client.list_amphorae(&lb.item.id).await?;

        let mut amphorae = Vec::with_capacity(values.len());
        for value in values {
            let amphora = Raw::<Amphora>::from_value(value)?;

            let image_name = match amphora.item.image_id.as_deref() {
                Some(image_id) => self.image_name(image_id).await?,
                None => None,
            };

            let server = match amphora.item.compute_id.as_deref() {
                Some(compute_id) => self
                    .client
                    .find_server(compute_id)
                    .await?
                    .map(Raw::<Server>::from_value)
                    .transpose()?,
                None => None,
            };

            amphorae.push(AmphoraEntry {
                amphora,
                server,
                image_name,
            });
        }

        Ok(AmphoraReport { lb, amphorae })
    }

    /// Resolve an image name, hitting Glance at most once per image id.
    async fn image_name(&mut self, image_id: &str) -> Result<Option<String>> {
        if let Some(name) = self.image_names.get(image_id) {
            return Ok(Some(name.clone()));
        }

        let Some(value) = self.client.find_image(image_id).await? else {
            tracing::warn!("Image {} not found", image_id);
            return Ok(None);
        };

        let image = Raw::<super::models::Image>::from_value(value)?;
        let name = image.item.name.unwrap_or_else(|| image.item.id.clone());
        self.image_names.insert(image_id.to_string(), name.clone());

        Ok(Some(name))
    }
}
