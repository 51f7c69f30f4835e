//! Backend selection
//!
//! The backend is picked once from `RACKFLOW_PROVIDER`; every command then
//! goes through the same [`Provider`].

use anyhow::Context;
use rackflow_cloud::{BackendKind, Provider, ProviderConfig};
use rackflow_cloud_aws::AwsProvider;
use rackflow_cloud_local::LocalProvider;

pub struct Backend {
    pub provider: Provider,
    local: Option<LocalProvider>,
}

impl Backend {
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = ProviderConfig::from_env().context("Failed to load provider configuration")?;
        Ok(Self::connect(config).await)
    }

    pub async fn connect(config: ProviderConfig) -> Self {
        tracing::debug!(backend = %config.backend, rack = %config.rack, "Selecting backend");
        match config.backend {
            BackendKind::Local => {
                let local = LocalProvider::new(&config);
                let services = local.services();
                Self {
                    provider: Provider::new(config, services),
                    local: Some(local),
                }
            }
            BackendKind::Aws => {
                let aws = AwsProvider::connect(&config).await;
                let services = aws.services();
                Self {
                    provider: Provider::new(config, services),
                    local: None,
                }
            }
        }
    }

    /// The local environment, for commands that only make sense there
    pub fn local(&self, command: &str) -> anyhow::Result<&LocalProvider> {
        self.local.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "`{}` is only available with the local backend (current: {})",
                command,
                self.provider.config().backend
            )
        })
    }
}
