//! Resource abstraction layer
//!
//! Typed models for the load balancer resource graph, filter criteria for
//! the LB listing, and the report assembly that walks the graph.
//!
//! # Architecture
//!
//! - [`models`] - Serde models plus the raw payloads they were parsed from
//! - [`filter`] - Server-side query criteria and the client-side name filter
//! - [`fetcher`] - Per-LB report assembly with bounded-concurrency member fetch

pub mod fetcher;
pub mod filter;
pub mod models;

pub use fetcher::{
    query_load_balancers, AmphoraEntry, AmphoraReport, LbReport, ListenerReport, MemberReport,
    PoolReport, ReportBuilder, ReportOptions,
};
pub use filter::LbFilters;
pub use models::{
    Amphora, HealthMonitor, IdRef, Image, Listener, LoadBalancer, Member, Pool, Raw, Server,
};
