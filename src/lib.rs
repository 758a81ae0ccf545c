//! Notify cloud tenants of upcoming compute outages.
//!
//! Finds the OpenStack instances on the hosts, availability zones or
//! aggregates going down, resolves the projects and users owning them, and
//! queues and sends notification emails.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod models;
pub mod openstack;
pub mod output;
pub mod processing;
pub mod providers;
pub mod testing;

pub use error::{NotifyError, Result};
pub use processing::{enrich, expand_hosts, Enrichment, EnrichmentSummary};
pub use providers::{ComputeProvider, IdentityProvider, Mailer};
