//! Database credential resolution.
//!
//! Credentials come from an ordered list of providers (secret, then
//! environment, then static configuration). Each field is resolved
//! independently: the first provider with a non-empty value wins.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

/// Default MySQL port when no provider supplies one.
pub const DEFAULT_PORT: u16 = 3306;

/// Environment variables read by [`EnvCredentials`].
pub const ENV_DB_HOST: &str = "GUESTBOOK_DB_HOST";
pub const ENV_DB_USERNAME: &str = "GUESTBOOK_DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "GUESTBOOK_DB_PASSWORD";
pub const ENV_DB_PORT: &str = "GUESTBOOK_DB_PORT";

/// Credential resolution error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("no credential provider supplied '{field}' (tried: {tried})")]
    Missing { field: &'static str, tried: String },
}

/// Possibly incomplete credentials from one provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
}

impl fmt::Debug for PartialCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("port", &self.port)
            .finish()
    }
}

/// Complete connection credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One source of credentials.
pub trait CredentialProvider: Send + Sync {
    /// Short name for logs and errors
    fn name(&self) -> &'static str;

    fn credentials(&self) -> PartialCredentials;
}

/// Credentials decoded from the secret store.
pub struct SecretCredentials(pub PartialCredentials);

impl CredentialProvider for SecretCredentials {
    fn name(&self) -> &'static str {
        "secret"
    }

    fn credentials(&self) -> PartialCredentials {
        self.0.clone()
    }
}

/// Credentials from `GUESTBOOK_DB_*` environment variables.
pub struct EnvCredentials {
    vars: HashMap<&'static str, String>,
}

impl EnvCredentials {
    /// Snapshot the process environment.
    pub fn from_process_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = [ENV_DB_HOST, ENV_DB_USERNAME, ENV_DB_PASSWORD, ENV_DB_PORT]
            .into_iter()
            .filter_map(|key| lookup(key).map(|v| (key, v)))
            .collect();
        Self { vars }
    }
}

impl CredentialProvider for EnvCredentials {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn credentials(&self) -> PartialCredentials {
        PartialCredentials {
            host: self.vars.get(ENV_DB_HOST).cloned(),
            username: self.vars.get(ENV_DB_USERNAME).cloned(),
            password: self.vars.get(ENV_DB_PASSWORD).cloned(),
            // An unparsable port is treated as unset so later providers apply
            port: self
                .vars
                .get(ENV_DB_PORT)
                .and_then(|p| p.trim().parse().ok()),
        }
    }
}

/// Credentials from the `[db]` table of the configuration file.
pub struct StaticCredentials(pub PartialCredentials);

impl CredentialProvider for StaticCredentials {
    fn name(&self) -> &'static str {
        "config"
    }

    fn credentials(&self) -> PartialCredentials {
        self.0.clone()
    }
}

/// Ordered provider list.
#[derive(Default)]
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider with lower priority than those already added.
    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Resolve every field, first non-empty value wins.
    pub fn resolve(&self) -> Result<DbCredentials, CredentialError> {
        let snapshots: Vec<(&'static str, PartialCredentials)> = self
            .providers
            .iter()
            .map(|p| (p.name(), p.credentials()))
            .collect();

        let host = self.pick(&snapshots, "host", |c| c.host.clone())?;
        let username = self.pick(&snapshots, "username", |c| c.username.clone())?;
        let password = self.pick(&snapshots, "password", |c| c.password.clone())?;
        let port = snapshots
            .iter()
            .find_map(|(name, c)| c.port.map(|p| (*name, p)))
            .map(|(name, port)| {
                debug!(field = "port", provider = name, "Credential resolved");
                port
            })
            .unwrap_or(DEFAULT_PORT);

        Ok(DbCredentials {
            host,
            port,
            username,
            password,
        })
    }

    fn pick(
        &self,
        snapshots: &[(&'static str, PartialCredentials)],
        field: &'static str,
        get: impl Fn(&PartialCredentials) -> Option<String>,
    ) -> Result<String, CredentialError> {
        snapshots
            .iter()
            .find_map(|(name, c)| {
                get(c)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*name, v))
            })
            .map(|(name, value)| {
                debug!(field, provider = name, "Credential resolved");
                value
            })
            .ok_or_else(|| CredentialError::Missing {
                field,
                tried: self.provider_names(),
            })
    }

    fn provider_names(&self) -> String {
        self.providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
