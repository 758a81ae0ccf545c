//! Instance enrichment.
//!
//! Binds every instance to its owning project and the users holding a role
//! on that project. Project and user lookups are memoized for one pass.

use crate::error::Result;
use crate::models::{Instance, Project, User};
use crate::providers::IdentityProvider;
use futures::{Stream, TryStreamExt};
use std::collections::HashMap;
use std::fmt;

/// A project touched by the outage, with its users and servers.
#[derive(Debug)]
pub struct AffectedProject {
    pub project: Project,
    /// Indexes into [`Enrichment::users`], in role assignment order.
    users: Vec<usize>,
    /// Indexes into [`Enrichment::servers`], in input order.
    servers: Vec<usize>,
}

/// An instance bound to its project.
#[derive(Debug)]
pub struct AffectedServer {
    pub instance: Instance,
    project: usize,
}

/// Counts reported after an enrichment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichmentSummary {
    pub total_servers: usize,
    pub total_projects: usize,
    pub total_users: usize,
}

/// Result of [`enrich`]: servers, projects and users of one pass.
#[derive(Debug, Default)]
pub struct Enrichment {
    servers: Vec<AffectedServer>,
    projects: Vec<AffectedProject>,
    users: Vec<User>,
}

impl Enrichment {
    /// Servers in the order they were received.
    pub fn servers(&self) -> &[AffectedServer] {
        &self.servers
    }

    /// Projects in the order they were first seen.
    pub fn projects(&self) -> &[AffectedProject] {
        &self.projects
    }

    /// Distinct users in the order they were first seen.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn project_of(&self, server: &AffectedServer) -> &AffectedProject {
        &self.projects[server.project]
    }

    /// Users of the project owning `server`.
    pub fn users_for<'a>(&'a self, server: &AffectedServer) -> impl Iterator<Item = &'a User> + 'a {
        self.users_of(self.project_of(server))
    }

    pub fn users_of<'a>(
        &'a self,
        project: &'a AffectedProject,
    ) -> impl Iterator<Item = &'a User> + 'a {
        project.users.iter().map(move |&i| &self.users[i])
    }

    pub fn servers_of<'a>(
        &'a self,
        project: &'a AffectedProject,
    ) -> impl Iterator<Item = &'a Instance> + 'a {
        project
            .servers
            .iter()
            .map(move |&i| &self.servers[i].instance)
    }

    pub fn summary(&self) -> EnrichmentSummary {
        EnrichmentSummary {
            total_servers: self.servers.len(),
            total_projects: self.projects.len(),
            total_users: self.users.len(),
        }
    }
}

/// Resolve project and users for every instance of `instances`.
///
/// Each distinct tenant id costs one project lookup and one role assignment
/// listing; each distinct user id costs one user lookup. Group assignments
/// are skipped.
///
/// # Errors
/// Any error from the stream or the identity provider aborts the whole pass.
pub async fn enrich<S, I>(instances: S, identity: &I) -> Result<Enrichment>
where
    S: Stream<Item = Result<Instance>>,
    I: IdentityProvider + ?Sized,
{
    let mut projects_seen: HashMap<String, usize> = HashMap::new();
    let mut users_seen: HashMap<String, usize> = HashMap::new();
    let mut enrichment = Enrichment::default();

    futures::pin_mut!(instances);
    while let Some(instance) = instances.try_next().await? {
        let cached = projects_seen.get(&instance.tenant_id).copied();
        let project_idx = match cached {
            Some(idx) => idx,
            None => {
                let project = identity.get_project(&instance.tenant_id).await?;
                log::debug!("Resolved project {} ({})", project.name, project.id);

                let mut users = Vec::new();
                for assignment in identity
                    .list_role_assignments(&instance.tenant_id)
                    .await?
                {
                    let Some(user_id) = assignment.user_id() else {
                        log::debug!("Skipping group assignment on project {}", project.id);
                        continue;
                    };
                    let user_idx = match users_seen.get(user_id).copied() {
                        Some(idx) => idx,
                        None => {
                            let user = identity.get_user(user_id).await?;
                            enrichment.users.push(user);
                            let idx = enrichment.users.len() - 1;
                            users_seen.insert(user_id.to_string(), idx);
                            idx
                        }
                    };
                    if !users.contains(&user_idx) {
                        users.push(user_idx);
                    }
                }

                enrichment.projects.push(AffectedProject {
                    project,
                    users,
                    servers: Vec::new(),
                });
                let idx = enrichment.projects.len() - 1;
                projects_seen.insert(instance.tenant_id.clone(), idx);
                idx
            }
        };

        let server_idx = enrichment.servers.len();
        enrichment.projects[project_idx].servers.push(server_idx);
        enrichment.servers.push(AffectedServer {
            instance,
            project: project_idx,
        });
    }

    Ok(enrichment)
}

impl fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total number of users affected: {:7} user(s).",
            self.total_users
        )?;
        writeln!(
            f,
            "Total number of projects affected: {:4} project(s).",
            self.total_projects
        )?;
        write!(
            f,
            "Total number of instances affected: {:3} instance(s).",
            self.total_servers
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::testing::{sample_instance, FakeIdentity};
    use futures::stream;

    fn ok_stream(instances: Vec<Instance>) -> impl Stream<Item = Result<Instance>> {
        stream::iter(instances.into_iter().map(Ok))
    }

    fn identity() -> FakeIdentity {
        FakeIdentity::new()
            .with_project("p-alpha", "alpha", &["u-1", "u-2"])
            .with_project("p-beta", "beta", &["u-2", "u-3", "u-2"])
            .with_user("u-1", Some("one@example.org"))
            .with_user("u-2", Some("two@example.org"))
            .with_user("u-3", None)
    }

    #[tokio::test]
    async fn test_project_lookup_once_per_tenant() {
        let identity = identity();
        let instances = (0..50)
            .map(|i| {
                let tenant = if i % 2 == 0 { "p-alpha" } else { "p-beta" };
                sample_instance(&format!("vm{i}"), "qh2-rcc10", "ACTIVE", tenant)
            })
            .collect();

        let enrichment = enrich(ok_stream(instances), &identity)
            .await
            .expect("Error enriching instances");

        assert_eq!(identity.log.count("get_project:p-alpha"), 1);
        assert_eq!(identity.log.count("get_project:p-beta"), 1);
        assert_eq!(identity.log.count("list_role_assignments:"), 2);
        assert_eq!(
            enrichment.summary(),
            EnrichmentSummary {
                total_servers: 50,
                total_projects: 2,
                total_users: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_user_lookup_once_across_projects() {
        let identity = identity();
        let instances = vec![
            sample_instance("a", "h1", "ACTIVE", "p-alpha"),
            sample_instance("b", "h1", "ACTIVE", "p-beta"),
        ];
        let enrichment = enrich(ok_stream(instances), &identity).await.unwrap();

        assert_eq!(identity.log.count("get_user:u-2"), 1);
        assert_eq!(identity.log.count("get_user:"), 3);

        // Duplicate assignment of u-2 on beta yields one entry
        let beta = &enrichment.projects()[1];
        let beta_users: Vec<&str> = enrichment.users_of(beta).map(|u| u.id.as_str()).collect();
        assert_eq!(beta_users, vec!["u-2", "u-3"]);
    }

    #[tokio::test]
    async fn test_same_tenant_shares_project() {
        let identity = identity();
        let instances = vec![
            sample_instance("a", "h1", "ACTIVE", "p-alpha"),
            sample_instance("b", "h2", "ACTIVE", "p-beta"),
            sample_instance("c", "h3", "SHUTOFF", "p-alpha"),
        ];
        let enrichment = enrich(ok_stream(instances), &identity).await.unwrap();

        let servers = enrichment.servers();
        let ids: Vec<&str> = servers.iter().map(|s| s.instance.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"], "Input order must be kept");

        let first = enrichment.project_of(&servers[0]);
        let third = enrichment.project_of(&servers[2]);
        assert!(std::ptr::eq(first, third));
        assert!(!std::ptr::eq(first, enrichment.project_of(&servers[1])));

        let alpha_servers: Vec<&str> = enrichment
            .servers_of(first)
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(alpha_servers, vec!["a", "c"]);

        let users: Vec<&str> = enrichment
            .users_for(&servers[2])
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(users, vec!["u-1", "u-2"]);
    }

    #[tokio::test]
    async fn test_group_assignments_skipped() {
        let identity = FakeIdentity::new()
            .with_project("p-alpha", "alpha", &["u-1"])
            .with_group_assignment("p-alpha", "g-ops")
            .with_user("u-1", None);
        let enrichment = enrich(
            ok_stream(vec![sample_instance("a", "h1", "ACTIVE", "p-alpha")]),
            &identity,
        )
        .await
        .unwrap();
        assert_eq!(enrichment.summary().total_users, 1);
    }

    #[tokio::test]
    async fn test_missing_user_fails_pass() {
        let identity = FakeIdentity::new().with_project("p-alpha", "alpha", &["ghost"]);
        let err = enrich(
            ok_stream(vec![sample_instance("a", "h1", "ACTIVE", "p-alpha")]),
            &identity,
        )
        .await
        .unwrap_err();
        match err {
            NotifyError::Lookup { kind, id } => {
                assert_eq!(kind, "User");
                assert_eq!(id, "ghost");
            }
            other => panic!("Expected Lookup error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_error_fails_pass() {
        let identity = identity();
        let instances = stream::iter(vec![
            Ok(sample_instance("a", "h1", "ACTIVE", "p-alpha")),
            Err(NotifyError::lookup("Server", "missing")),
        ]);
        assert!(enrich(instances, &identity).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let identity = identity();
        let enrichment = enrich(ok_stream(vec![]), &identity).await.unwrap();
        assert_eq!(enrichment.summary(), EnrichmentSummary::default());
        assert!(identity.log.calls().is_empty());
    }
}
