//! File-backed secret store for running without AWS.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{SecretError, SecretPayload, SecretStore};

/// Serves the content of one local file as the string value of any
/// requested secret.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn get_secret(&self, secret_id: &str) -> Result<SecretPayload, SecretError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SecretError::retrieval(secret_id, e))?;

        Ok(SecretPayload::from_string(secret_id, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_secret_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host":"localhost","username":"root","password":"pw"}}"#).unwrap();

        let store = FileSecretStore::new(file.path());
        let payload = store.get_secret("local").await.unwrap();
        let creds = payload.credentials().unwrap();

        assert_eq!(payload.secret_id, "local");
        assert_eq!(creds.host.as_deref(), Some("localhost"));
    }

    #[tokio::test]
    async fn missing_file_is_retrieval_error() {
        let store = FileSecretStore::new("/nonexistent/guestbook-secret.json");
        let err = store.get_secret("local").await.unwrap_err();
        assert!(matches!(err, SecretError::Retrieval { .. }));
    }
}
