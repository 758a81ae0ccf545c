//! In-memory providers for tests and dry runs.
//!
//! Each fake counts the calls it receives so callers can check how often the
//! cloud would have been queried.

use crate::error::{NotifyError, Result};
use crate::models::{Aggregate, Instance, Project, RoleAssignment, ServerFilter, User};
use crate::output::OutboxMessage;
use crate::providers::{ComputeProvider, IdentityProvider, Mailer};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;

/// Call counters keyed by "method:id".
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    fn record(&self, call: String) {
        self.calls.lock().expect("call log poisoned").push(call);
    }

    /// Number of calls whose key starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("call log poisoned")
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

/// Identity provider backed by maps.
#[derive(Debug, Default)]
pub struct FakeIdentity {
    projects: HashMap<String, Project>,
    users: HashMap<String, User>,
    assignments: HashMap<String, Vec<RoleAssignment>>,
    pub log: CallLog,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project and grant a role on it to each listed user id.
    pub fn with_project(mut self, id: &str, name: &str, user_ids: &[&str]) -> Self {
        self.projects.insert(id.to_string(), sample_project(id, name));
        self.assignments.insert(
            id.to_string(),
            user_ids.iter().map(|u| RoleAssignment::for_user(u)).collect(),
        );
        self
    }

    pub fn with_user(mut self, id: &str, email: Option<&str>) -> Self {
        self.users.insert(id.to_string(), sample_user(id, email));
        self
    }

    /// Add a group assignment, which carries no user.
    pub fn with_group_assignment(mut self, project_id: &str, group_id: &str) -> Self {
        self.assignments
            .entry(project_id.to_string())
            .or_default()
            .push(RoleAssignment {
                user: None,
                group: Some(crate::models::ActorRef {
                    id: group_id.to_string(),
                }),
            });
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_project(&self, id: &str) -> Result<Project> {
        self.log.record(format!("get_project:{id}"));
        self.projects
            .get(id)
            .cloned()
            .ok_or_else(|| NotifyError::lookup("Project", id))
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        self.log.record(format!("get_user:{id}"));
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| NotifyError::lookup("User", id))
    }

    async fn list_role_assignments(&self, project_id: &str) -> Result<Vec<RoleAssignment>> {
        self.log.record(format!("list_role_assignments:{project_id}"));
        Ok(self.assignments.get(project_id).cloned().unwrap_or_default())
    }
}

/// Compute provider backed by a list of servers and aggregates.
#[derive(Debug, Default)]
pub struct FakeCompute {
    servers: Vec<Instance>,
    aggregates: Vec<Aggregate>,
    pub log: CallLog,
}

impl FakeCompute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, id: &str, host: &str, status: &str, tenant_id: &str) -> Self {
        self.servers.push(sample_instance(id, host, status, tenant_id));
        self
    }

    pub fn with_aggregate(mut self, name: &str, hosts: &[&str], zone: Option<&str>) -> Self {
        let mut aggregate = Aggregate {
            name: name.to_string(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        };
        if let Some(zone) = zone {
            aggregate.metadata.insert(
                crate::models::AVAILABILITY_ZONE_KEY.to_string(),
                zone.to_string(),
            );
        }
        self.aggregates.push(aggregate);
        self
    }
}

#[async_trait]
impl ComputeProvider for FakeCompute {
    fn list_servers(&self, filter: ServerFilter) -> BoxStream<'_, Result<Instance>> {
        self.log.record(format!(
            "list_servers:{}:{}",
            filter.host.as_deref().unwrap_or("*"),
            filter.status.as_deref().unwrap_or("*")
        ));
        let matches: Vec<Result<Instance>> = self
            .servers
            .iter()
            .filter(|s| filter.host.is_none() || s.host == filter.host)
            .filter(|s| {
                filter
                    .status
                    .as_deref()
                    .map_or(true, |status| s.status.eq_ignore_ascii_case(status))
            })
            .cloned()
            .map(Ok)
            .collect();
        stream::iter(matches).boxed()
    }

    async fn get_server(&self, id: &str) -> Result<Instance> {
        self.log.record(format!("get_server:{id}"));
        self.servers
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| NotifyError::lookup("Server", id))
    }

    async fn list_aggregates(&self) -> Result<Vec<Aggregate>> {
        self.log.record("list_aggregates".to_string());
        Ok(self.aggregates.clone())
    }
}

/// Mailer that keeps every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboxMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboxMessage> {
        self.sent.lock().expect("mailer poisoned").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &OutboxMessage) -> Result<()> {
        self.sent.lock().expect("mailer poisoned").push(message.clone());
        Ok(())
    }
}

pub fn sample_project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(format!("Test project {name}")),
        domain_id: Some("default".to_string()),
        enabled: true,
    }
}

pub fn sample_user(id: &str, email: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: format!("user-{id}"),
        email: email.map(str::to_string),
        enabled: true,
    }
}

pub fn sample_instance(id: &str, host: &str, status: &str, tenant_id: &str) -> Instance {
    Instance {
        id: id.to_string(),
        name: format!("vm-{id}"),
        host: Some(host.to_string()),
        status: status.to_string(),
        tenant_id: tenant_id.to_string(),
    }
}
