//! Local backend assembly

use crate::apps::LocalApps;
use crate::identity::LocalIdentity;
use crate::network::IpCommandProvisioner;
use crate::stacks::LocalStacks;
use crate::storage::FileStorage;
use rackflow_cloud::{BackendServices, HostTable, NamespacedObjectStore, ProviderConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Suffix of formation template files
pub const FORMATION_SUFFIX: &str = ".json.tmpl";

/// Formation templates compiled into the binary
pub const FORMATION: &[(&str, &str)] = &[
    ("app", include_str!("../formation/app.json.tmpl")),
    ("rack", include_str!("../formation/rack.json.tmpl")),
];

/// Recorded host addresses, relative to the storage root
pub const HOSTS_FILE: &str = "network/hosts.json";

/// Local simulated environment rooted at the configured storage root
pub struct LocalProvider {
    root: PathBuf,
    network_command: String,
    storage: Arc<FileStorage>,
    apps: Arc<LocalApps>,
    stacks: Arc<LocalStacks>,
    identity: Arc<LocalIdentity>,
    hosts: Arc<HostTable>,
}

impl LocalProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let root = &config.storage_root;
        tracing::debug!(root = %root.display(), "Using local backend");

        Self {
            root: root.clone(),
            network_command: config.network_command.clone(),
            storage: Arc::new(FileStorage::new(root)),
            apps: Arc::new(LocalApps::new(root)),
            stacks: Arc::new(LocalStacks::new(root)),
            identity: Arc::new(LocalIdentity::new(config.account_id.clone())),
            hosts: Arc::new(HostTable::new()),
        }
    }

    pub fn apps(&self) -> &LocalApps {
        &self.apps
    }

    pub fn stacks(&self) -> &LocalStacks {
        &self.stacks
    }

    pub fn hosts(&self) -> &Arc<HostTable> {
        &self.hosts
    }

    pub fn services(&self) -> BackendServices {
        BackendServices {
            stacks: self.stacks.clone(),
            identity: self.identity.clone(),
            objects: Arc::new(NamespacedObjectStore::new(
                self.apps.clone(),
                self.storage.clone(),
            )),
            network: Some(Arc::new(
                IpCommandProvisioner::new(self.hosts.clone())
                    .with_program(&self.network_command)
                    .with_state_file(self.root.join(HOSTS_FILE)),
            )),
            templates: FORMATION,
            template_suffix: FORMATION_SUFFIX.to_string(),
        }
    }
}
