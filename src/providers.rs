//! Collaborator interfaces.
//!
//! The core only talks to the cloud and the mail relay through these traits,
//! so tests can swap in in-memory fakes.

use crate::error::Result;
use crate::models::{Aggregate, Instance, Project, RoleAssignment, ServerFilter, User};
use crate::output::OutboxMessage;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Project and user lookups (Keystone).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_project(&self, id: &str) -> Result<Project>;

    async fn get_user(&self, id: &str) -> Result<User>;

    /// All role assignments scoped to the given project.
    async fn list_role_assignments(&self, project_id: &str) -> Result<Vec<RoleAssignment>>;
}

/// Server and aggregate lookups (Nova).
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Lazily list servers matching `filter`.
    ///
    /// The stream is single pass; iterating again requires a new call, which
    /// queries the service again.
    fn list_servers(&self, filter: ServerFilter) -> BoxStream<'_, Result<Instance>>;

    async fn get_server(&self, id: &str) -> Result<Instance>;

    async fn list_aggregates(&self) -> Result<Vec<Aggregate>>;
}

/// Delivers one queued message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutboxMessage) -> Result<()>;
}
