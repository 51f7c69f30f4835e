//! Provider configuration
//!
//! Built once, either from the environment or programmatically, and shared by
//! reference across every operation of a provider.

use crate::error::{ProviderError, Result};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_ACCOUNT_ID: &str = "000000000000";
const DEFAULT_OBJECTS_RESOURCE: &str = "Settings";
const DEFAULT_NETWORK_COMMAND: &str = "ip";

/// Which backend serves the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Real cloud account
    Aws,
    /// Simulated environment on the local filesystem
    Local,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Aws => write!(f, "aws"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(BackendKind::Aws),
            "local" => Ok(BackendKind::Local),
            other => Err(ProviderError::InvalidConfig(format!(
                "unknown provider backend: {other}"
            ))),
        }
    }
}

/// Host convention for artifact repositories:
/// `{account}.{service_host}.{region}.{domain_suffix}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryHost {
    pub service_host: String,
    pub domain_suffix: String,
}

impl Default for RegistryHost {
    fn default() -> Self {
        Self {
            service_host: "dkr.ecr".to_string(),
            domain_suffix: "amazonaws.com".to_string(),
        }
    }
}

impl RegistryHost {
    pub fn new(service_host: impl Into<String>, domain_suffix: impl Into<String>) -> Self {
        Self {
            service_host: service_host.into(),
            domain_suffix: domain_suffix.into(),
        }
    }

    /// Full repository address
    pub fn address(&self, account_id: &str, region: &str, repository: &str) -> String {
        format!(
            "{}.{}.{}.{}/{}",
            account_id, self.service_host, region, self.domain_suffix, repository
        )
    }
}

impl std::str::FromStr for RegistryHost {
    type Err = ProviderError;

    /// Parse `service_host/domain_suffix`, e.g. `dkr.ecr/amazonaws.com`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((service, suffix)) if !service.is_empty() && !suffix.is_empty() => {
                Ok(Self::new(service, suffix))
            }
            _ => Err(ProviderError::InvalidConfig(format!(
                "registry host must look like 'service_host/domain_suffix': {s}"
            ))),
        }
    }
}

/// Configuration shared by every operation issued through one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub backend: BackendKind,
    pub region: String,
    pub rack: String,
    pub development: bool,
    /// Root for local storage (objects, apps, simulated stacks)
    pub storage_root: PathBuf,
    /// Overrides the backend's bundled template directory
    pub template_dir: Option<PathBuf>,
    pub registry_host: RegistryHost,
    /// Rack resource holding the object bucket
    pub objects_resource: String,
    /// Account reported by the local identity service
    pub account_id: String,
    /// Executable the local backend runs as `{cmd} addr add {ip} dev {iface}`
    pub network_command: String,
}

impl ProviderConfig {
    /// Local backend configuration for `rack` rooted at `storage_root`
    pub fn new(rack: impl Into<String>, storage_root: impl Into<PathBuf>) -> Result<Self> {
        let rack = rack.into();
        validate_rack(&rack)?;

        Ok(Self {
            backend: BackendKind::Local,
            region: DEFAULT_REGION.to_string(),
            rack,
            development: false,
            storage_root: storage_root.into(),
            template_dir: None,
            registry_host: RegistryHost::default(),
            objects_resource: DEFAULT_OBJECTS_RESOURCE.to_string(),
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            network_command: DEFAULT_NETWORK_COMMAND.to_string(),
        })
    }

    /// Read the configuration from the environment
    ///
    /// - `RACK` (required)
    /// - `RACKFLOW_PROVIDER`: `aws` or `local` (default `local`)
    /// - `AWS_REGION` (default `us-east-1`)
    /// - `DEVELOPMENT`: `true` enables development mode
    /// - `RACKFLOW_STORAGE_ROOT` (default: platform data dir + `rackflow`)
    /// - `RACKFLOW_TEMPLATE_DIR`
    /// - `RACKFLOW_REGISTRY_HOST`: `service_host/domain_suffix`
    /// - `RACKFLOW_ACCOUNT_ID`
    /// - `RACKFLOW_NETWORK_COMMAND` (default `ip`)
    pub fn from_env() -> Result<Self> {
        let rack = std::env::var("RACK")
            .map_err(|_| ProviderError::InvalidConfig("RACK is not set".to_string()))?;

        let storage_root = match std::env::var("RACKFLOW_STORAGE_ROOT") {
            Ok(root) => PathBuf::from(root),
            Err(_) => dirs::data_local_dir()
                .ok_or_else(|| {
                    ProviderError::InvalidConfig(
                        "no data directory found; set RACKFLOW_STORAGE_ROOT".to_string(),
                    )
                })?
                .join("rackflow"),
        };

        let mut config = Self::new(rack, storage_root)?;

        if let Ok(backend) = std::env::var("RACKFLOW_PROVIDER") {
            config.backend = backend.parse()?;
        }
        if let Ok(region) = std::env::var("AWS_REGION")
            && !region.is_empty()
        {
            config.region = region;
        }
        config.development = std::env::var("DEVELOPMENT").is_ok_and(|v| v == "true");
        config.template_dir = std::env::var("RACKFLOW_TEMPLATE_DIR").ok().map(PathBuf::from);
        if let Ok(host) = std::env::var("RACKFLOW_REGISTRY_HOST") {
            config.registry_host = host.parse()?;
        }
        if let Ok(account) = std::env::var("RACKFLOW_ACCOUNT_ID") {
            config.account_id = account;
        }
        if let Ok(command) = std::env::var("RACKFLOW_NETWORK_COMMAND")
            && !command.is_empty()
        {
            config.network_command = command;
        }

        tracing::debug!(
            backend = %config.backend,
            rack = %config.rack,
            region = %config.region,
            "Loaded provider configuration"
        );
        Ok(config)
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    pub fn with_registry_host(mut self, host: RegistryHost) -> Self {
        self.registry_host = host;
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_network_command(mut self, command: impl Into<String>) -> Self {
        self.network_command = command.into();
        self
    }
}

fn validate_rack(rack: &str) -> Result<()> {
    naming::validate_name("rack", rack).map_err(|e| ProviderError::InvalidConfig(e.to_string()))
}
