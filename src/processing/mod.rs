//! Outage processing logic.
//!
//! This module contains the business logic between the cloud and the outbox:
//! - [`hosts`] - Expansion of host-range expressions
//! - [`search`] - Finding affected instances by host, zone, aggregate or file
//! - [`enrich`] - Resolving projects and users of the affected instances

mod enrich;
mod hosts;
mod search;

// Re-export public functions
pub use enrich::{enrich, AffectedProject, AffectedServer, Enrichment, EnrichmentSummary};
pub use hosts::expand_hosts;
pub use search::{
    host_filters, hosts_by_aggregates, hosts_by_zones, instances_by_file, instances_by_hosts,
};
