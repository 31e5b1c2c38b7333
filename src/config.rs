//! Credentials configuration
//!
//! Credentials are read from a YAML file with a `salesforce` group:
//!
//! ```yaml
//! salesforce:
//!   uname: user@example.com
//!   pwd: secret
//!   sftoken: TOKEN
//!   domain: test          # optional
//!   api_version: "59.0"   # optional
//! ```

use crate::error::ConfigError;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Default credentials file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Default login domain (`test` is the sandbox login host)
pub const DEFAULT_DOMAIN: &str = "test";

/// Default REST/SOAP API version
pub const DEFAULT_API_VERSION: &str = "59.0";

const GROUP: &str = "salesforce";

/// Salesforce login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
    pub domain: Option<String>,
    pub api_version: Option<String>,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            security_token: security_token.into(),
            domain: None,
            api_version: None,
        }
    }

    /// Resolve the login domain: an explicit override wins over the config file.
    pub fn domain_or<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.domain.as_deref())
            .unwrap_or(DEFAULT_DOMAIN)
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("security_token", &"<redacted>")
            .field("domain", &self.domain)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// A source of credentials for one run
pub trait CredentialsSource: Send + Sync {
    /// Load the credentials
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the source is missing, malformed, or incomplete
    fn load(&self) -> Result<Credentials, ConfigError>;
}

/// YAML credentials file on disk
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse credentials from YAML text
    pub fn parse(content: &str) -> Result<Credentials, ConfigError> {
        let root: Value = serde_yaml::from_str(content)?;
        let group = root
            .get(GROUP)
            .filter(|group| group.is_mapping())
            .ok_or_else(|| missing(GROUP))?;

        let required = |key: &str| scalar(group, key).ok_or_else(|| missing(key));

        Ok(Credentials {
            username: required("uname")?,
            password: required("pwd")?,
            security_token: required("sftoken")?,
            domain: scalar(group, "domain"),
            api_version: scalar(group, "api_version"),
        })
    }
}

impl CredentialsSource for ConfigFile {
    fn load(&self) -> Result<Credentials, ConfigError> {
        log::debug!("Loading credentials from {}", self.path.display());
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound {
                path: self.path.clone(),
            },
            _ => ConfigError::Io(e),
        })?;
        Self::parse(&content)
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
}

/// Read a scalar value as text; numbers and booleans keep their YAML spelling.
fn scalar(group: &Value, key: &str) -> Option<String> {
    match group.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
