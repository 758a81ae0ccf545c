//! Keystone authentication and authenticated JSON requests.

use crate::config::{CloudConfig, HTTP_TIMEOUT_SECS};
use crate::error::{from_json_str, NotifyError, Result};
use colored::Colorize;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Service entry of the token catalog.
#[derive(Deserialize, Debug, Clone)]
pub struct CatalogService {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CatalogEndpoint {
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize, Debug)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    catalog: Vec<CatalogService>,
}

/// An authenticated session shared by the service clients.
#[derive(Clone)]
pub struct Session {
    client: Client,
    token: String,
    catalog: Vec<CatalogService>,
    interface: String,
    region: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("services", &self.catalog.len())
            .field("interface", &self.interface)
            .field("region", &self.region)
            .finish()
    }
}

/// Keystone v3 base URL for an `OS_AUTH_URL` with or without the version.
pub fn identity_v3_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        base.to_string()
    } else {
        format!("{base}/v3")
    }
}

/// Password authentication request scoped to the configured project.
fn password_auth_body(config: &CloudConfig) -> serde_json::Value {
    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": config.username,
                        "domain": { "name": config.user_domain_name },
                        "password": config.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": config.project_name,
                    "domain": { "name": config.project_domain_name },
                }
            }
        }
    })
}

/// Map a non-success response status to an error.
///
/// A 404 becomes [`NotifyError::Lookup`] when `not_found` names the entity,
/// a 401 becomes [`NotifyError::Authentication`], anything else that is not
/// a success becomes [`NotifyError::Status`].
fn check_status(
    status: StatusCode,
    service: &'static str,
    url: &str,
    not_found: Option<(&'static str, &str)>,
) -> Result<()> {
    match (status, not_found) {
        (StatusCode::NOT_FOUND, Some((kind, id))) => Err(NotifyError::lookup(kind, id)),
        (StatusCode::UNAUTHORIZED, _) => Err(NotifyError::Authentication(format!(
            "token rejected by {service} at {url}"
        ))),
        (s, _) if !s.is_success() => {
            log::warn!("{} {status} from {url}", "failed".on_red());
            Err(NotifyError::Status {
                service,
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
        _ => Ok(()),
    }
}

impl Session {
    /// Request a project scoped token from Keystone.
    ///
    /// # Errors
    /// * [`NotifyError::Authentication`] if the credentials are rejected or
    ///   the response carries no token.
    pub async fn authenticate(config: &CloudConfig) -> Result<Session> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        let url = format!("{}/auth/tokens", identity_v3_url(&config.auth_url));
        log::debug!("authenticate({url}) as {}", config.username.on_blue());

        let response = client
            .post(&url)
            .json(&password_auth_body(config))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(NotifyError::Authentication(format!(
                "credentials for {} rejected by {url} ({status})",
                config.username
            )));
        }
        if !status.is_success() {
            return Err(NotifyError::Status {
                service: "identity",
                status: status.as_u16(),
                url,
            });
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                NotifyError::Authentication(format!("no {SUBJECT_TOKEN_HEADER} from {url}"))
            })?;

        let body = response.text().await?;
        let parsed: TokenResponse = from_json_str(&body)?;
        log::info!(
            "Authenticated {} on project {}, token expires {}",
            config.username,
            config.project_name,
            parsed.token.expires_at.as_deref().unwrap_or("unknown")
        );

        Ok(Session {
            client,
            token,
            catalog: parsed.token.catalog,
            interface: config.interface.clone(),
            region: config.region.clone(),
        })
    }

    /// Build a session from an existing token and catalog.
    pub fn from_parts(
        token: &str,
        catalog: Vec<CatalogService>,
        interface: &str,
        region: Option<&str>,
    ) -> Result<Session> {
        Ok(Session {
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            token: token.to_string(),
            catalog,
            interface: interface.to_string(),
            region: region.map(str::to_string),
        })
    }

    /// URL of `service_type` for the configured interface and region.
    pub fn endpoint(&self, service_type: &str) -> Result<String> {
        self.catalog
            .iter()
            .filter(|s| s.service_type == service_type)
            .flat_map(|s| s.endpoints.iter())
            .find(|e| {
                e.interface == self.interface
                    && self
                        .region
                        .as_ref()
                        .map_or(true, |r| e.region.as_ref() == Some(r))
            })
            .map(|e| e.url.trim_end_matches('/').to_string())
            .ok_or_else(|| NotifyError::lookup("Endpoint", service_type))
    }

    /// GET `url` and decode the JSON body, see `check_status` for errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, String)],
        not_found: Option<(&'static str, &str)>,
    ) -> Result<T> {
        log::debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .query(query)
            .send()
            .await?;

        check_status(response.status(), service, url, not_found)?;

        let body = response.text().await?;
        log::trace!("{service} response len={}", body.len());
        from_json_str(&body)
    }
}
