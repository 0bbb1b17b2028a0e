//! OpenStack API interaction module
//!
//! Core functionality for talking to an OpenStack cloud: Keystone
//! authentication, catalog endpoint resolution, and the HTTP client used for
//! the Octavia, Nova, and Glance APIs.
//!
//! # Module Structure
//!
//! - [`auth`] - Keystone v3 password authentication with token caching
//! - [`client`] - Main client exposing the load balancer retrieval operations
//! - [`http`] - HTTP utilities for REST API calls

pub mod auth;
pub mod client;
pub mod http;
