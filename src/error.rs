//! Error types shared by the library.

use thiserror::Error;

/// Errors raised while searching, enriching and notifying.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// A host-range expression (or other user input) could not be parsed.
    #[error("Invalid expression '{expression}': {reason}")]
    Parse { expression: String, reason: String },

    /// Credentials are missing or were rejected by the identity service.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A referenced project, user or server does not exist upstream.
    #[error("{kind} not found: {id}")]
    Lookup { kind: &'static str, id: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected status code from a cloud service.
    #[error("{service} returned {status} for {url}")]
    Status {
        service: &'static str,
        status: u16,
        url: String,
    },

    /// A response that parsed but makes no sense, e.g. a paging loop.
    #[error("Unexpected response from {service}: {reason}")]
    Protocol {
        service: &'static str,
        reason: String,
    },

    #[error("Error parsing JSON at path={path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Mail error: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

impl NotifyError {
    pub fn parse(expression: &str, reason: impl Into<String>) -> Self {
        NotifyError::Parse {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub fn lookup(kind: &'static str, id: &str) -> Self {
        NotifyError::Lookup {
            kind,
            id: id.to_string(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        NotifyError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Deserialize a JSON string, reporting the path of the first bad field.
pub fn from_json_str<T: serde::de::DeserializeOwned>(json: &str) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| NotifyError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}
