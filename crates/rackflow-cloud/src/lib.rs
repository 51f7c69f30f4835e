//! rackflow cloud provider abstraction
//!
//! Uniform infrastructure access for the platform: resource resolution,
//! repository addressing, formation rendering and app-scoped object storage,
//! served by interchangeable backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    Provider                      │
//! │  ResourceResolver  RepositoryResolver            │
//! │  TemplateRenderer  ObjectStore  NetworkProvisioner│
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  aws backend  │ │ local backend │
//! │ CFN / STS / S3│ │ fs / json / ip│
//! └───────────────┘ └───────────────┘
//! ```
//!
//! Backends implement the collaborator traits ([`StackDescriber`],
//! [`IdentityService`], [`AppRegistry`], [`BlobStorage`],
//! [`NetworkProvisioner`]) and are selected once when the [`Provider`] is
//! built.

pub mod config;
pub mod error;
pub mod naming;
pub mod network;
pub mod object;
pub mod provider;
pub mod repository;
pub mod resolver;

// Re-exports
pub use config::{BackendKind, ProviderConfig, RegistryHost};
pub use error::{ErrorKind, ProviderError, Result};
pub use network::{HostTable, NetworkProvisioner};
pub use object::{
    AppRegistry, BlobStorage, NamespacedObjectStore, Object, ObjectBody, ObjectStore,
    ObjectStoreOptions,
};
pub use provider::{BackendServices, Provider};
pub use repository::{IdentityService, RepositoryResolver};
pub use resolver::{ResourceResolver, StackDescriber};
