//! Host aggregate data model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key holding the availability zone of an aggregate.
pub const AVAILABILITY_ZONE_KEY: &str = "availability_zone";

/// A named grouping of hypervisor hosts.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Aggregate {
    pub fn availability_zone(&self) -> Option<&str> {
        self.metadata.get(AVAILABILITY_ZONE_KEY).map(String::as_str)
    }
}
