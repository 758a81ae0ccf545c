//! Identity service data models: projects, users and role assignments.

use serde::{Deserialize, Serialize};

/// A project (tenant) owning instances.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// A user holding a role on some project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Reference to the actor of a role assignment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActorRef {
    pub id: String,
}

/// A grant linking a user (or group) to a project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// None for group assignments.
    #[serde(default)]
    pub user: Option<ActorRef>,
    #[serde(default)]
    pub group: Option<ActorRef>,
}

impl RoleAssignment {
    pub fn for_user(user_id: &str) -> Self {
        RoleAssignment {
            user: Some(ActorRef {
                id: user_id.to_string(),
            }),
            group: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}
