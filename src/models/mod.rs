//! Domain models for outage notification.
//!
//! This module contains the records exchanged with the cloud services:
//! - [`Instance`] and [`ServerFilter`] - compute servers and how to query them
//! - [`Project`], [`User`] and [`RoleAssignment`] - identity records
//! - [`Aggregate`] - host aggregates and availability zones

mod aggregate;
mod identity;
mod instance;

// Re-export public types
pub use aggregate::{Aggregate, AVAILABILITY_ZONE_KEY};
pub use identity::{ActorRef, Project, RoleAssignment, User};
pub use instance::{Instance, ServerFilter};
