//! OpenStack API interaction.
//!
//! This module handles all cloud-related operations:
//! - [`session`] - Keystone authentication and the service catalog
//! - [`identity`] - Keystone v3 projects, users and role assignments
//! - [`compute`] - Nova servers and host aggregates

mod compute;
mod identity;
mod session;

// Re-export public types and functions
pub use compute::NovaClient;
pub use identity::KeystoneClient;
pub use session::{identity_v3_url, CatalogEndpoint, CatalogService, Session};
