//! Keystone v3 client.

use super::session::{identity_v3_url, Session};
use crate::error::Result;
use crate::models::{Project, RoleAssignment, User};
use crate::providers::IdentityProvider;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct ProjectBody {
    project: Project,
}

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Deserialize)]
struct RoleAssignmentsBody {
    role_assignments: Vec<RoleAssignment>,
}

pub struct KeystoneClient {
    session: Arc<Session>,
    endpoint: String,
}

impl KeystoneClient {
    /// Use the identity endpoint of the session catalog.
    pub fn new(session: Arc<Session>) -> Result<KeystoneClient> {
        let endpoint = identity_v3_url(&session.endpoint("identity")?);
        log::debug!("Keystone endpoint {endpoint}");
        Ok(KeystoneClient { session, endpoint })
    }
}

#[async_trait]
impl IdentityProvider for KeystoneClient {
    async fn get_project(&self, id: &str) -> Result<Project> {
        let url = format!("{}/projects/{id}", self.endpoint);
        let body: ProjectBody = self
            .session
            .get_json("identity", &url, &[], Some(("Project", id)))
            .await?;
        Ok(body.project)
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        let url = format!("{}/users/{id}", self.endpoint);
        let body: UserBody = self
            .session
            .get_json("identity", &url, &[], Some(("User", id)))
            .await?;
        Ok(body.user)
    }

    async fn list_role_assignments(&self, project_id: &str) -> Result<Vec<RoleAssignment>> {
        let url = format!("{}/role_assignments", self.endpoint);
        let body: RoleAssignmentsBody = self
            .session
            .get_json(
                "identity",
                &url,
                &[("scope.project.id", project_id.to_string())],
                Some(("Project", project_id)),
            )
            .await?;
        Ok(body.role_assignments)
    }
}
