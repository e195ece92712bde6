//! Secret store abstraction and credential payload decoding.
//!
//! Startup fetches one secret by name. Failing to fetch or decode it is
//! fatal; there is no retry.

pub mod aws;
pub mod file;

use std::fmt;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::credentials::PartialCredentials;

pub use aws::AwsSecretStore;
pub use file::FileSecretStore;

/// Secret store error
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// The store could not return the secret
    #[error("failed to retrieve secret '{secret_id}': {source}")]
    Retrieval {
        secret_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The secret was returned but is not usable credentials
    #[error("failed to decode secret '{secret_id}': {reason}")]
    Decode { secret_id: String, reason: String },
}

impl SecretError {
    pub fn retrieval(
        secret_id: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Retrieval {
            secret_id: secret_id.into(),
            source: source.into(),
        }
    }

    pub fn decode(secret_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            secret_id: secret_id.into(),
            reason: reason.into(),
        }
    }
}

/// Raw secret as returned by a store. At most one field is normally set.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretPayload {
    pub secret_id: String,
    pub string: Option<String>,
    pub binary: Option<Vec<u8>>,
}

// Never print secret material
impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("secret_id", &self.secret_id)
            .field("string", &self.string.as_ref().map(|_| "<redacted>"))
            .field("binary", &self.binary.as_ref().map(|b| b.len()))
            .finish()
    }
}

impl SecretPayload {
    pub fn from_string(secret_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            string: Some(value.into()),
            binary: None,
        }
    }

    pub fn from_binary(secret_id: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            secret_id: secret_id.into(),
            string: None,
            binary: Some(value.into()),
        }
    }

    /// Secret text. The string field wins; binary content is base64-decoded,
    /// or taken as UTF-8 when it is not base64.
    pub fn text(&self) -> Result<String, SecretError> {
        if let Some(s) = &self.string {
            return Ok(s.clone());
        }

        let Some(bytes) = &self.binary else {
            return Err(SecretError::decode(
                &self.secret_id,
                "secret has neither a string nor a binary value",
            ));
        };

        let decoded = BASE64
            .decode(trim_ascii(bytes))
            .unwrap_or_else(|_| bytes.clone());

        String::from_utf8(decoded)
            .map_err(|_| SecretError::decode(&self.secret_id, "binary secret is not valid UTF-8"))
    }

    /// Parse the secret JSON as database credentials.
    pub fn credentials(&self) -> Result<PartialCredentials, SecretError> {
        let text = self.text()?;
        let doc: SecretDocument = serde_json::from_str(&text).map_err(|e| {
            // serde_json errors never echo input, only position
            SecretError::decode(&self.secret_id, format!("invalid credentials JSON: {e}"))
        })?;

        Ok(PartialCredentials {
            host: doc.host,
            username: doc.username,
            password: doc.password,
            port: doc.port.map(PortValue::into_port).transpose().map_err(|reason| {
                SecretError::decode(&self.secret_id, reason)
            })?,
        })
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Credentials document as stored by RDS-managed secrets. Extra keys such
/// as `engine` or `dbname` are ignored.
#[derive(Deserialize)]
struct SecretDocument {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    port: Option<PortValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

impl PortValue {
    fn into_port(self) -> Result<u16, String> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        };
        raw.trim()
            .parse::<u16>()
            .map_err(|_| format!("invalid port '{raw}'"))
    }
}

/// A source of named secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Short name for logs
    fn kind(&self) -> &'static str;

    async fn get_secret(&self, secret_id: &str) -> Result<SecretPayload, SecretError>;
}
