//! Compute instance data model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A virtual machine record as returned by the compute service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Server UUID.
    pub id: String,
    /// Display name of the server.
    #[serde(default)]
    pub name: String,
    /// Hypervisor host the server is scheduled on (admin only attribute).
    #[serde(rename = "OS-EXT-SRV-ATTR:host", default)]
    pub host: Option<String>,
    /// Server status, e.g. ACTIVE, SHUTOFF.
    #[serde(default)]
    pub status: String,
    /// Owning project (tenant) id.
    pub tenant_id: String,
}

/// Query options for listing servers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerFilter {
    pub host: Option<String>,
    pub status: Option<String>,
    /// List servers of every project, not only the authenticated one.
    pub all_tenants: bool,
}

impl ServerFilter {
    /// Query string pairs in the form the compute API expects.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.all_tenants {
            pairs.push(("all_tenants", "1".to_string()));
        }
        if let Some(host) = &self.host {
            pairs.push(("host", host.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {} [{}]",
            self.name,
            self.id,
            self.host.as_deref().unwrap_or("unknown"),
            self.status
        )
    }
}
