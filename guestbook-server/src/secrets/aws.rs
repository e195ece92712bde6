//! AWS Secrets Manager store.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;

use super::{SecretError, SecretPayload, SecretStore};

/// Fetches secrets with `GetSecretValue` in one region.
///
/// Credentials for the AWS call itself come from the default provider
/// chain (instance profile on the fleet, env/profile locally).
#[derive(Clone, Debug)]
pub struct AwsSecretStore {
    client: Client,
}

impl AwsSecretStore {
    pub async fn new(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    fn kind(&self) -> &'static str {
        "aws-secretsmanager"
    }

    async fn get_secret(&self, secret_id: &str) -> Result<SecretPayload, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| SecretError::retrieval(secret_id, DisplayErrorContext(e).to_string()))?;

        Ok(SecretPayload {
            secret_id: secret_id.to_owned(),
            string: output.secret_string().map(str::to_owned),
            binary: output.secret_binary().map(|b| b.as_ref().to_vec()),
        })
    }
}
