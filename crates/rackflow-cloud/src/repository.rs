//! Artifact repository addressing
//!
//! Combines the caller's account (from the identity service), the region and
//! the app's `Repository` stack resource into a pullable address.

use crate::config::RegistryHost;
use crate::error::{ProviderError, Result};
use crate::resolver::ResourceResolver;
use async_trait::async_trait;
use std::sync::Arc;

/// Logical id of the per-app repository resource
pub const REPOSITORY_RESOURCE: &str = "Repository";

const ARN_FIELDS: usize = 6;
const ARN_ACCOUNT_FIELD: usize = 4;

/// Identity backend describing the current caller
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Colon-delimited identifier of the caller, e.g.
    /// `arn:aws:iam::123456789012:user/alice`
    async fn caller_arn(&self) -> Result<String>;
}

/// Extract the account id (field 4) from a six-field ARN
pub fn parse_account_id(arn: &str) -> Result<&str> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() != ARN_FIELDS {
        return Err(ProviderError::MalformedIdentity(format!(
            "expected {ARN_FIELDS} colon-delimited fields, got {}: {arn}",
            parts.len()
        )));
    }
    Ok(parts[ARN_ACCOUNT_FIELD])
}

/// Resolves `app` to its repository address
#[derive(Clone)]
pub struct RepositoryResolver {
    identity: Arc<dyn IdentityService>,
    resolver: ResourceResolver,
    region: String,
    host: RegistryHost,
}

impl RepositoryResolver {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        resolver: ResourceResolver,
        region: impl Into<String>,
        host: RegistryHost,
    ) -> Self {
        Self {
            identity,
            resolver,
            region: region.into(),
            host,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn app_repository_address(&self, app: &str) -> Result<String> {
        let arn = self
            .identity
            .caller_arn()
            .await
            .map_err(|e| ProviderError::IdentityLookup(Box::new(e)))?;

        let account_id = parse_account_id(&arn)?;

        let repository = self
            .resolver
            .resolve_app_resource(app, REPOSITORY_RESOURCE)
            .await
            .map_err(|e| ProviderError::RepositoryLookup(Box::new(e)))?;

        let address = self.host.address(account_id, &self.region, &repository);
        tracing::debug!(address = %address, "Resolved repository address");
        Ok(address)
    }
}
