//! Provider facade
//!
//! Aggregates resolution, repository addressing, template rendering, object
//! storage and host provisioning behind one value. Backends only supply the
//! collaborators in [`BackendServices`]; callers never branch on the backend.

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::network::NetworkProvisioner;
use crate::object::{Object, ObjectBody, ObjectStore, ObjectStoreOptions};
use crate::repository::{IdentityService, RepositoryResolver};
use crate::resolver::{ResourceResolver, StackDescriber};
use rackflow_core::TemplateRenderer;
use serde::Serialize;
use std::sync::Arc;

/// Collaborators a backend plugs into a [`Provider`]
pub struct BackendServices {
    pub stacks: Arc<dyn StackDescriber>,
    pub identity: Arc<dyn IdentityService>,
    pub objects: Arc<dyn ObjectStore>,
    pub network: Option<Arc<dyn NetworkProvisioner>>,
    /// Formation templates compiled into the backend, as `(name, source)`
    pub templates: &'static [(&'static str, &'static str)],
    /// Suffix of template files in a configured template directory
    pub template_suffix: String,
}

/// Configured capability set handed to the rest of the platform
pub struct Provider {
    config: Arc<ProviderConfig>,
    resolver: ResourceResolver,
    repository: RepositoryResolver,
    renderer: TemplateRenderer,
    objects: Arc<dyn ObjectStore>,
    network: Option<Arc<dyn NetworkProvisioner>>,
}

impl Provider {
    pub fn new(config: ProviderConfig, services: BackendServices) -> Self {
        let config = Arc::new(config);

        let resolver = ResourceResolver::new(config.rack.clone(), services.stacks);
        let repository = RepositoryResolver::new(
            services.identity,
            resolver.clone(),
            config.region.clone(),
            config.registry_host.clone(),
        );

        // A configured directory takes precedence; built-ins fill the gaps
        let mut renderer = match &config.template_dir {
            Some(dir) => TemplateRenderer::new(dir),
            None => TemplateRenderer::embedded(),
        }
        .with_suffix(services.template_suffix);
        for (name, source) in services.templates {
            renderer.add_builtin(*name, *source);
        }

        tracing::debug!(
            backend = %config.backend,
            rack = %config.rack,
            template_dir = ?config.template_dir,
            "Provider ready"
        );

        Self {
            config,
            resolver,
            repository,
            renderer,
            objects: services.objects,
            network: services.network,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Shared handle to the configuration
    pub fn shared_config(&self) -> Arc<ProviderConfig> {
        Arc::clone(&self.config)
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    /// Renderer, mutable so callers can register helpers before rendering
    pub fn renderer_mut(&mut self) -> &mut TemplateRenderer {
        &mut self.renderer
    }

    pub async fn resolve_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String> {
        self.resolver.resolve_stack_resource(stack, logical_id).await
    }

    pub async fn resolve_rack_resource(&self, logical_id: &str) -> Result<String> {
        self.resolver.resolve_rack_resource(logical_id).await
    }

    pub async fn resolve_app_resource(&self, app: &str, logical_id: &str) -> Result<String> {
        self.resolver.resolve_app_resource(app, logical_id).await
    }

    pub async fn app_repository_address(&self, app: &str) -> Result<String> {
        self.repository.app_repository_address(app).await
    }

    /// Render a formation template into canonical JSON
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.renderer.render(name, data)?)
    }

    pub async fn fetch(&self, app: &str, key: &str) -> Result<ObjectBody> {
        self.objects.fetch(app, key).await
    }

    pub async fn store(
        &self,
        app: &str,
        key: &str,
        body: ObjectBody,
        options: ObjectStoreOptions,
    ) -> Result<Object> {
        self.objects.store(app, key, body, options).await
    }

    pub async fn create_host(&self, iface: &str, subnet: &str, host: &str) -> Result<String> {
        let network = self.network.as_ref().ok_or_else(|| {
            ProviderError::InvalidConfig(format!(
                "the {} backend does not provision hosts",
                self.config.backend
            ))
        })?;
        network.create_host(iface, subnet, host).await
    }
}
