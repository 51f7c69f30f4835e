//! Host address provisioning
//!
//! The host table is owned by whoever provisions addresses and handed to them
//! explicitly; there is no process-wide registry.

use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Assigns an address to `host` on `iface` within `subnet`
#[async_trait]
pub trait NetworkProvisioner: Send + Sync {
    /// Address assigned to `host`, e.g. `10.42.0.3` for subnet `10.42.0`
    async fn create_host(&self, iface: &str, subnet: &str, host: &str) -> Result<String>;
}

/// Addresses handed out to hosts
#[derive(Debug, Default)]
pub struct HostTable {
    /// host name -> address
    hosts: Mutex<BTreeMap<String, String>>,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with previously assigned addresses
    pub fn with_hosts(hosts: BTreeMap<String, String>) -> Self {
        Self {
            hosts: Mutex::new(hosts),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned table is still consistent: every update is a single insert/remove
        self.hosts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserve the lowest free `{subnet}.{n}` address (n >= 1) for `host`
    ///
    /// Returns the existing address and `false` when the host already has one.
    pub fn reserve(&self, subnet: &str, host: &str) -> Result<(String, bool)> {
        let mut hosts = self.lock();
        if let Some(existing) = hosts.get(host) {
            return Ok((existing.clone(), false));
        }

        let taken: BTreeSet<&String> = hosts.values().collect();
        let address = (1..=254u16)
            .map(|n| format!("{subnet}.{n}"))
            .find(|candidate| !taken.contains(candidate))
            .ok_or_else(|| {
                ProviderError::InvalidInput(format!("no free address left in {subnet}"))
            })?;

        hosts.insert(host.to_string(), address.clone());
        Ok((address, true))
    }

    /// Undo a reservation whose provisioning failed
    pub fn release(&self, host: &str) {
        self.lock().remove(host);
    }

    /// Merge addresses recorded elsewhere; entries already in the table win
    pub fn restore(&self, recorded: BTreeMap<String, String>) {
        let mut hosts = self.lock();
        for (host, address) in recorded {
            hosts.entry(host).or_insert(address);
        }
    }

    pub fn address_of(&self, host: &str) -> Option<String> {
        self.lock().get(host).cloned()
    }

    pub fn hosts(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }
}
