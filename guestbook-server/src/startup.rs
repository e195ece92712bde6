//! Process startup: secret retrieval, credential resolution, and spawning
//! the connection manager.

use tracing::info;

use crate::config::GuestbookConfig;
use crate::credentials::{
    CredentialChain, CredentialError, DbCredentials, EnvCredentials, SecretCredentials,
    StaticCredentials,
};
use crate::db::{ConnectionManager, MySqlConnector, Supervisor};
use crate::secrets::{AwsSecretStore, FileSecretStore, SecretError, SecretStore};

/// Startup error. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Secret store selected by configuration.
pub async fn secret_store(config: &GuestbookConfig) -> Box<dyn SecretStore> {
    match &config.secret_file {
        Some(path) => Box::new(FileSecretStore::new(path)),
        None => Box::new(AwsSecretStore::new(&config.region).await),
    }
}

/// Fetch the secret once and resolve credentials through the provider
/// chain secret, environment, config file.
pub async fn resolve_credentials(
    config: &GuestbookConfig,
    store: &dyn SecretStore,
    env: EnvCredentials,
) -> Result<DbCredentials, StartupError> {
    info!(
        store = store.kind(),
        region = %config.region,
        secret = %config.secret_name,
        "Fetching database credentials"
    );

    let payload = store.get_secret(&config.secret_name).await?;
    let from_secret = payload.credentials()?;

    let credentials = CredentialChain::new()
        .with(SecretCredentials(from_secret))
        .with(env)
        .with(StaticCredentials(config.db.clone()))
        .resolve()?;

    info!(
        host = %credentials.host,
        port = credentials.port,
        user = %credentials.username,
        "Database credentials resolved"
    );
    Ok(credentials)
}

/// Run the startup sequence and spawn the connection supervisor.
///
/// Returns as soon as the supervisor is running; the first connection is
/// established in the background and requests queue until it is ready.
pub async fn start(config: &GuestbookConfig) -> Result<(ConnectionManager, Supervisor), StartupError> {
    let store = secret_store(config).await;
    let credentials =
        resolve_credentials(config, store.as_ref(), EnvCredentials::from_process_env()).await?;

    let connector = MySqlConnector::new(&credentials);
    Ok(ConnectionManager::spawn(connector, config.manager_config()))
}
