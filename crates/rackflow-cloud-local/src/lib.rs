//! Local backend for rackflow
//!
//! Simulates a rack on the local filesystem:
//!
//! - objects under `apps/{app}/objects/{key}` (atomic temp-file + rename writes)
//! - apps registered as `apps/{app}/app.json`
//! - stacks recorded as `stacks/{stack}.json`
//! - host addresses added with `ip addr add` (Linux only) and recorded in
//!   `network/hosts.json`
//!
//! # Example
//!
//! ```ignore
//! use rackflow_cloud::{Provider, ProviderConfig};
//! use rackflow_cloud_local::LocalProvider;
//!
//! let config = ProviderConfig::new("dev", "/var/lib/rackflow")?;
//! let local = LocalProvider::new(&config);
//! local.apps().create_app("web").await?;
//!
//! let provider = Provider::new(config, local.services());
//! let object = provider.store("web", "build.tgz", body, Default::default()).await?;
//! ```

pub mod apps;
pub mod identity;
pub mod network;
pub mod provider;
pub mod stacks;
pub mod storage;

pub use apps::{AppRecord, LocalApps};
pub use identity::LocalIdentity;
pub use network::{HostsRecord, IpCommandProvisioner};
pub use provider::{FORMATION, FORMATION_SUFFIX, HOSTS_FILE, LocalProvider};
pub use stacks::{LocalStacks, StackRecord};
pub use storage::FileStorage;
