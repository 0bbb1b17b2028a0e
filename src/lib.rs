//! openstack-lb-info - Show OpenStack Load Balancer details
//!
//! Queries an OpenStack environment and presents detailed information about
//! load balancers and their components: listeners, pools, health monitors,
//! members, and amphorae. Connects through Keystone and renders the result as
//! plain text, rich (colored) trees, or JSON.
//!
//! # Example
//!
//! ```bash
//! # Show a load balancer by name
//! openstack-lb-info --type lb --name my_lb
//!
//! # Show the amphorae of a load balancer, with all attributes
//! openstack-lb-info --type amphora --id 807d29f6-c2f1-4e9d-a9b6-e6d71cbb8f00 --details
//!
//! # JSON output for scripting
//! openstack-lb-info --type lb -o json
//! ```

pub mod config;
pub mod openstack;
pub mod output;
pub mod resource;

pub use config::CloudConfig;
pub use openstack::client::{OsClient, ServiceEndpoints};
pub use output::OutputFormat;
pub use resource::{LbFilters, ReportBuilder, ReportOptions};
