//! Host provisioning with `ip addr add`
//!
//! Assigned addresses are recorded in `network/hosts.json` under the storage
//! root so later runs keep allocating from the lowest free slot.

use async_trait::async_trait;
use rackflow_cloud::{HostTable, NetworkProvisioner, ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::fs;
use tokio::process::Command;
use tokio::sync::Mutex;

const IP_PROGRAM: &str = "ip";
const HOSTS_VERSION: u32 = 1;

/// Recorded host addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostsRecord {
    pub version: u32,
    /// host name -> address
    pub hosts: BTreeMap<String, String>,
}

/// Load the recorded addresses; an absent file means none
pub async fn load_hosts(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(ProviderError::Io(e)),
    };

    let record: HostsRecord = serde_json::from_str(&content)?;
    if record.version > HOSTS_VERSION {
        return Err(ProviderError::InvalidConfig(format!(
            "{} has version {} newer than supported version {}",
            path.display(),
            record.version,
            HOSTS_VERSION
        )));
    }
    Ok(record.hosts)
}

/// Replace the recorded addresses
pub async fn save_hosts(path: &Path, hosts: BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let record = HostsRecord {
        version: HOSTS_VERSION,
        hosts,
    };
    let temp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
    fs::write(&temp, serde_json::to_string_pretty(&record)?).await?;
    if let Err(e) = fs::rename(&temp, path).await {
        if let Err(cleanup) = fs::remove_file(&temp).await {
            tracing::warn!(path = %temp.display(), error = %cleanup, "Failed to remove partial write");
        }
        return Err(ProviderError::Io(e));
    }
    Ok(())
}

/// Adds host addresses to a network interface
///
/// A failed command is fatal: the reservation is released and the error is
/// returned with the command's stderr.
pub struct IpCommandProvisioner {
    program: String,
    table: Arc<HostTable>,
    state_file: Option<PathBuf>,
    /// Serializes load, reserve and save within the process
    update: Mutex<()>,
}

impl IpCommandProvisioner {
    pub fn new(table: Arc<HostTable>) -> Self {
        Self {
            program: IP_PROGRAM.to_string(),
            table,
            state_file: None,
            update: Mutex::new(()),
        }
    }

    /// Record assigned addresses in `path` across runs
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Run a different executable with the same arguments
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn table(&self) -> &Arc<HostTable> {
        &self.table
    }

    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, args.join(" "));

        let output = cmd
            .output()
            .await
            .map_err(|e| ProviderError::CommandFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::CommandFailed(format!(
                "{} {}: {}",
                self.program,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl NetworkProvisioner for IpCommandProvisioner {
    #[tracing::instrument(skip(self))]
    async fn create_host(&self, iface: &str, subnet: &str, host: &str) -> Result<String> {
        if iface.is_empty() || subnet.is_empty() || host.is_empty() {
            return Err(ProviderError::InvalidInput(
                "interface, subnet and host must not be blank".to_string(),
            ));
        }

        let _update = self.update.lock().await;
        if let Some(path) = &self.state_file {
            self.table.restore(load_hosts(path).await?);
        }

        let (address, fresh) = self.table.reserve(subnet, host)?;
        if !fresh {
            tracing::debug!(address = %address, "Host already provisioned");
            return Ok(address);
        }

        if let Some(path) = &self.state_file
            && let Err(e) = save_hosts(path, self.table.hosts()).await
        {
            self.table.release(host);
            return Err(e);
        }

        if let Err(e) = self
            .run_command(&["addr", "add", &address, "dev", iface])
            .await
        {
            self.table.release(host);
            if let Some(path) = &self.state_file
                && let Err(cleanup) = save_hosts(path, self.table.hosts()).await
            {
                tracing::warn!(path = %path.display(), error = %cleanup, "Failed to drop released host");
            }
            return Err(e);
        }

        tracing::info!(host = %host, address = %address, iface = %iface, "Provisioned host");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command_registers_host() {
        let provisioner = IpCommandProvisioner::new(Arc::new(HostTable::new())).with_program("true");

        let address = provisioner.create_host("lo", "10.42.0", "web").await.unwrap();
        assert_eq!(address, "10.42.0.1");
        assert_eq!(provisioner.table().address_of("web").as_deref(), Some("10.42.0.1"));

        let again = provisioner.create_host("lo", "10.42.0", "web").await.unwrap();
        assert_eq!(again, address);
    }

    #[tokio::test]
    async fn test_failed_command_is_fatal() {
        let table = Arc::new(HostTable::new());
        let provisioner = IpCommandProvisioner::new(table.clone()).with_program("false");

        let err = provisioner.create_host("lo", "10.42.0", "web").await.unwrap_err();
        assert!(matches!(err, ProviderError::CommandFailed(_)));
        assert!(table.hosts().is_empty());
    }

    #[tokio::test]
    async fn test_state_file_carries_allocations_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("network/hosts.json");
        let provisioner = |program: &str| {
            IpCommandProvisioner::new(Arc::new(HostTable::new()))
                .with_program(program)
                .with_state_file(&state)
        };

        for (host, expected) in [("web", "10.42.0.1"), ("api", "10.42.0.2"), ("web", "10.42.0.1")] {
            let address = provisioner("true")
                .create_host("lo", "10.42.0", host)
                .await
                .unwrap();
            assert_eq!(address, expected);
        }

        assert!(
            provisioner("false")
                .create_host("lo", "10.42.0", "cron")
                .await
                .is_err()
        );
        let hosts = load_hosts(&state).await.unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(!hosts.contains_key("cron"));
    }

    #[tokio::test]
    async fn test_missing_state_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_hosts(&dir.path().join("hosts.json")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let provisioner = IpCommandProvisioner::new(Arc::new(HostTable::new()))
            .with_program("rackflow-no-such-program");
        assert!(matches!(
            provisioner.create_host("lo", "10.42.0", "web").await,
            Err(ProviderError::CommandFailed(_))
        ));
    }
}
