//! Caller identity via STS

use async_trait::async_trait;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::DisplayErrorContext;
use rackflow_cloud::{IdentityService, ProviderError, Result};

/// `GetCallerIdentity` for the configured credentials
#[derive(Debug, Clone)]
pub struct StsIdentity {
    client: Client,
}

impl StsIdentity {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityService for StsIdentity {
    async fn caller_arn(&self) -> Result<String> {
        tracing::debug!("GetCallerIdentity");

        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| {
                ProviderError::BackendUnavailable(DisplayErrorContext(&err).to_string())
            })?;

        output.arn().map(str::to_string).ok_or_else(|| {
            ProviderError::MalformedIdentity("caller identity has no ARN".to_string())
        })
    }
}
