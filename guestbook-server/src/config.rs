//! Service configuration.
//!
//! Layering, lowest to highest priority: built-in defaults, the TOML file,
//! environment variables. Command-line flags are applied by the binary on
//! top of the loaded value.
//!
//! ```toml
//! region = "eu-central-1"
//! secret_name = "guestbook-dev-master-credentials"
//! database = "guestbook"
//!
//! [db]            # fallback credentials, used after secret and env
//! host = "localhost"
//! username = "root"
//! password = "root"
//!
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [manager]
//! retry_interval_ms = 2000     # minimum 2000
//! heartbeat_interval_secs = 30
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::credentials::PartialCredentials;
use crate::db::manager::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RETRY_INTERVAL};
use crate::db::{DatabaseName, ManagerConfig};

pub const DEFAULT_REGION: &str = "eu-central-1";
pub const DEFAULT_SECRET_NAME: &str = "guestbook-dev-master-credentials";
pub const DEFAULT_HTTP_PORT: u16 = 8080;

pub const ENV_REGION: &str = "GUESTBOOK_REGION";
pub const ENV_SECRET_NAME: &str = "GUESTBOOK_SECRET_NAME";
pub const ENV_SECRET_FILE: &str = "GUESTBOOK_SECRET_FILE";
pub const ENV_CONFIG: &str = "GUESTBOOK_CONFIG";
pub const ENV_DATABASE: &str = "DATABASE";
pub const ENV_PORT: &str = "PORT";

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config invalid: {0}")]
    Invalid(String),
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct GuestbookConfig {
    /// Secret store region
    pub region: String,
    /// Secret holding the database credentials
    pub secret_name: String,
    /// Read the secret from this file instead of AWS
    pub secret_file: Option<PathBuf>,
    pub database: DatabaseName,
    /// Lowest-priority credentials
    pub db: PartialCredentials,
    pub bind_addr: SocketAddr,
    pub cors_permissive: bool,
    pub retry_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for GuestbookConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_owned(),
            secret_name: DEFAULT_SECRET_NAME.to_owned(),
            secret_file: None,
            database: DatabaseName::default(),
            db: PartialCredentials::default(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT)),
            cors_permissive: false,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    region: Option<String>,
    secret_name: Option<String>,
    secret_file: Option<PathBuf>,
    database: Option<String>,
    #[serde(default)]
    db: FileDb,
    #[serde(default)]
    server: FileServer,
    #[serde(default)]
    manager: FileManager,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileDb {
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServer {
    bind: Option<SocketAddr>,
    cors_permissive: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileManager {
    retry_interval_ms: Option<u64>,
    heartbeat_interval_secs: Option<u64>,
}

impl GuestbookConfig {
    /// Load from the process environment and an optional config file.
    ///
    /// An explicit `path` must exist. Without one, `GUESTBOOK_CONFIG` is
    /// tried, then `~/.guestbook/config.toml` if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup.
    pub fn load_with(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match Self::locate(path, &env) {
            Some(path) => Self::read_file(&path)?,
            None => FileConfig::default(),
        };

        let mut config = Self::default();
        config.apply_file(file)?;
        config.apply_env(&env)?;
        Ok(config)
    }

    /// Default config file location: ~/.guestbook/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".guestbook").join("config.toml"))
    }

    /// Manager settings derived from this configuration.
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            database: self.database.clone(),
            retry_interval: self.retry_interval,
            heartbeat_interval: self.heartbeat_interval,
            ..ManagerConfig::default()
        }
    }

    fn locate(path: Option<&Path>, env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        if let Some(path) = path {
            return Some(path.to_path_buf());
        }
        if let Some(path) = env(ENV_CONFIG).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        Self::default_path().filter(|p| p.exists())
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(region) = file.region {
            self.region = region;
        }
        if let Some(secret_name) = file.secret_name {
            self.secret_name = secret_name;
        }
        if file.secret_file.is_some() {
            self.secret_file = file.secret_file;
        }
        if let Some(database) = file.database {
            self.database = parse_database(&database)?;
        }

        self.db = PartialCredentials {
            host: file.db.host,
            username: file.db.username,
            password: file.db.password,
            port: file.db.port,
        };

        if let Some(bind) = file.server.bind {
            self.bind_addr = bind;
        }
        if let Some(cors) = file.server.cors_permissive {
            self.cors_permissive = cors;
        }

        if let Some(ms) = file.manager.retry_interval_ms {
            let interval = Duration::from_millis(ms);
            if interval < DEFAULT_RETRY_INTERVAL {
                return Err(ConfigError::Invalid(format!(
                    "manager.retry_interval_ms must be at least {}",
                    DEFAULT_RETRY_INTERVAL.as_millis()
                )));
            }
            self.retry_interval = interval;
        }
        if let Some(secs) = file.manager.heartbeat_interval_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "manager.heartbeat_interval_secs must be positive".into(),
                ));
            }
            self.heartbeat_interval = Duration::from_secs(secs);
        }

        Ok(())
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = var(ENV_REGION) {
            self.region = region;
        }
        if let Some(secret_name) = var(ENV_SECRET_NAME) {
            self.secret_name = secret_name;
        }
        if let Some(secret_file) = var(ENV_SECRET_FILE) {
            self.secret_file = Some(PathBuf::from(secret_file));
        }
        if let Some(database) = var(ENV_DATABASE) {
            self.database = parse_database(&database)?;
        }
        if let Some(port) = var(ENV_PORT) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_PORT} is not a port: '{port}'")))?;
            self.bind_addr.set_port(port);
        }

        Ok(())
    }
}

fn parse_database(raw: &str) -> Result<DatabaseName, ConfigError> {
    DatabaseName::new(raw).map_err(|e| ConfigError::Invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file_or_env() {
        let file = write_config("");
        let config = GuestbookConfig::load_with(Some(file.path()), env(&[])).unwrap();

        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.secret_name, "guestbook-dev-master-credentials");
        assert_eq!(config.database.as_str(), "guestbook");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.retry_interval, Duration::from_millis(2000));
        assert!(config.secret_file.is_none());
    }

    #[test]
    fn file_values_apply() {
        let file = write_config(
            r#"
            region = "us-east-1"
            database = "gb_test"

            [db]
            host = "localhost"
            username = "root"
            password = "root"

            [server]
            bind = "127.0.0.1:3000"
            cors_permissive = true

            [manager]
            retry_interval_ms = 5000
            "#,
        );
        let config = GuestbookConfig::load_with(Some(file.path()), env(&[])).unwrap();

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.database.as_str(), "gb_test");
        assert_eq!(config.db.host.as_deref(), Some("localhost"));
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert!(config.cors_permissive);
        assert_eq!(config.manager_config().retry_interval, Duration::from_millis(5000));
    }

    #[test]
    fn env_overrides_file() {
        let file = write_config("region = \"us-east-1\"\ndatabase = \"from_file\"\n");
        let config = GuestbookConfig::load_with(
            Some(file.path()),
            env(&[
                (ENV_REGION, "ap-south-1"),
                (ENV_SECRET_NAME, "prod-creds"),
                (ENV_DATABASE, "from_env"),
                (ENV_PORT, "9090"),
                (ENV_SECRET_FILE, "/run/secrets/db.json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.region, "ap-south-1");
        assert_eq!(config.secret_name, "prod-creds");
        assert_eq!(config.database.as_str(), "from_env");
        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.secret_file, Some(PathBuf::from("/run/secrets/db.json")));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let file = write_config("");
        let config =
            GuestbookConfig::load_with(Some(file.path()), env(&[(ENV_REGION, "")])).unwrap();
        assert_eq!(config.region, DEFAULT_REGION);
    }

    #[test]
    fn rejects_unsafe_database_name() {
        let file = write_config("");
        let err = GuestbookConfig::load_with(
            Some(file.path()),
            env(&[(ENV_DATABASE, "gb; DROP TABLE x")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_retry_interval_below_fixed_backoff() {
        for ms in [0, 1999] {
            let file = write_config(&format!("[manager]\nretry_interval_ms = {ms}\n"));
            let err = GuestbookConfig::load_with(Some(file.path()), env(&[])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{ms} ms accepted");
        }

        let file = write_config("[manager]\nretry_interval_ms = 2000\n");
        let config = GuestbookConfig::load_with(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.retry_interval, DEFAULT_RETRY_INTERVAL);
    }

    #[test]
    fn rejects_zero_heartbeat() {
        let file = write_config("[manager]\nheartbeat_interval_secs = 0\n");
        let err = GuestbookConfig::load_with(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let file = write_config("[db]\nhostname = \"typo\"\n");
        let err = GuestbookConfig::load_with(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let err = GuestbookConfig::load_with(
            Some(Path::new("/nonexistent/guestbook.toml")),
            env(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn config_env_var_locates_file() {
        let file = write_config("secret_name = \"located\"\n");
        let path = file.path().to_string_lossy().into_owned();
        let config = GuestbookConfig::load_with(None, env(&[(ENV_CONFIG, path.as_str())])).unwrap();
        assert_eq!(config.secret_name, "located");
    }
}
