//! Configuration constants and cloud credentials.

use crate::error::{NotifyError, Result};
use std::fmt;

/// SMTP relay used by SEND when none is given.
pub const DEFAULT_SMTP_SERVER: &str = "127.0.0.1";
/// Timezone label printed next to the outage window.
pub const DEFAULT_TIMEZONE: &str = "AEDT";
/// Format of the `--start-time` argument, e.g. "09:00 25-06-2015".
pub const START_TIME_FORMAT: &str = "%H:%M %d-%m-%Y";
/// Request timeout for the cloud APIs.
pub const HTTP_TIMEOUT_SECS: u64 = 60;
/// Default sender for queued messages.
pub const DEFAULT_FROM: &str = "cloud-support@localhost";

const DEFAULT_DOMAIN: &str = "Default";

/// Credentials and endpoint selection for the OpenStack services.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub user_domain_name: String,
    pub project_domain_name: String,
    /// Endpoint interface to pick from the catalog (public, internal, admin).
    pub interface: String,
    pub region: Option<String>,
}

impl CloudConfig {
    /// Read the `OS_*` variables of an openrc file from the process environment.
    pub fn from_env() -> Result<CloudConfig> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<CloudConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut missing = Vec::new();
        let mut required = |key: &'static str, value: Option<String>| {
            value.unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };

        let auth_url = required("OS_AUTH_URL", get("OS_AUTH_URL"));
        let username = required("OS_USERNAME", get("OS_USERNAME"));
        let password = required("OS_PASSWORD", get("OS_PASSWORD"));
        let project_name = required(
            "OS_PROJECT_NAME",
            get("OS_PROJECT_NAME").or_else(|| get("OS_TENANT_NAME")),
        );

        if !missing.is_empty() {
            return Err(NotifyError::Authentication(format!(
                "missing {} (have you sourced your admin openrc credentials?)",
                missing.join(", ")
            )));
        }

        Ok(CloudConfig {
            auth_url,
            username,
            password,
            project_name,
            user_domain_name: get("OS_USER_DOMAIN_NAME")
                .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            project_domain_name: get("OS_PROJECT_DOMAIN_NAME")
                .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            interface: get("OS_INTERFACE").unwrap_or_else(|| "public".to_string()),
            region: get("OS_REGION_NAME"),
        })
    }
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("project_name", &self.project_name)
            .field("user_domain_name", &self.user_domain_name)
            .field("project_domain_name", &self.project_domain_name)
            .field("interface", &self.interface)
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = CloudConfig::from_lookup(lookup_from(&[
            ("OS_AUTH_URL", "https://keystone.example.org:5000/v3"),
            ("OS_USERNAME", "admin"),
            ("OS_PASSWORD", "secret"),
            ("OS_TENANT_NAME", "admin"),
        ]))
        .expect("Config should be complete");
        assert_eq!(config.project_name, "admin");
        assert_eq!(config.user_domain_name, "Default");
        assert_eq!(config.project_domain_name, "Default");
        assert_eq!(config.interface, "public");
        assert_eq!(config.region, None);
    }

    #[test]
    fn test_from_lookup_lists_every_missing_field() {
        let err = CloudConfig::from_lookup(lookup_from(&[
            ("OS_AUTH_URL", "https://keystone.example.org:5000/v3"),
            ("OS_PASSWORD", " "),
        ]))
        .unwrap_err();
        match err {
            NotifyError::Authentication(msg) => {
                assert!(msg.contains("OS_USERNAME"), "{msg}");
                assert!(msg.contains("OS_PASSWORD"), "{msg}");
                assert!(msg.contains("OS_PROJECT_NAME"), "{msg}");
                assert!(!msg.contains("OS_AUTH_URL"), "{msg}");
            }
            other => panic!("Expected Authentication error, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let config = CloudConfig::from_lookup(lookup_from(&[
            ("OS_AUTH_URL", "http://k:5000"),
            ("OS_USERNAME", "admin"),
            ("OS_PASSWORD", "hunter2"),
            ("OS_PROJECT_NAME", "admin"),
        ]))
        .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
