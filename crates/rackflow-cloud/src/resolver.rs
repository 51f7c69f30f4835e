//! Logical to physical resource resolution
//!
//! Every lookup goes to the backend; nothing is cached here.

use crate::error::{ProviderError, Result};
use crate::naming;
use async_trait::async_trait;
use std::sync::Arc;

/// Backend RPC answering "which physical resource backs this logical id"
#[async_trait]
pub trait StackDescriber: Send + Sync {
    /// Physical id of `logical_id` in `stack`
    ///
    /// Fails with `StackResourceNotFound` when the stack or resource is absent
    /// and with `BackendUnavailable` when the call cannot complete.
    async fn describe_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String>;
}

/// Resolves rack and app resources through the stack naming convention
#[derive(Clone)]
pub struct ResourceResolver {
    rack: String,
    stacks: Arc<dyn StackDescriber>,
}

impl ResourceResolver {
    pub fn new(rack: impl Into<String>, stacks: Arc<dyn StackDescriber>) -> Self {
        Self {
            rack: rack.into(),
            stacks,
        }
    }

    pub fn rack(&self) -> &str {
        &self.rack
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String> {
        if stack.is_empty() {
            return Err(ProviderError::InvalidInput(
                "stack name must not be blank".to_string(),
            ));
        }
        if logical_id.is_empty() {
            return Err(ProviderError::InvalidInput(
                "logical resource id must not be blank".to_string(),
            ));
        }

        let physical = self
            .stacks
            .describe_stack_resource(stack, logical_id)
            .await?;
        tracing::debug!(physical_id = %physical, "Resolved stack resource");
        Ok(physical)
    }

    /// Resource of the rack's own stack
    pub async fn resolve_rack_resource(&self, logical_id: &str) -> Result<String> {
        self.resolve_stack_resource(&self.rack, logical_id).await
    }

    /// Resource of the `{rack}-{app}` stack
    pub async fn resolve_app_resource(&self, app: &str, logical_id: &str) -> Result<String> {
        let stack = naming::app_stack_name(&self.rack, app)?;
        self.resolve_stack_resource(&stack, logical_id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stacks that record every describe call
    #[derive(Default)]
    pub(crate) struct FakeStacks {
        pub resources: HashMap<(String, String), String>,
        pub calls: Mutex<Vec<(String, String)>>,
        pub unavailable: bool,
    }

    impl FakeStacks {
        pub fn with(mut self, stack: &str, logical: &str, physical: &str) -> Self {
            self.resources
                .insert((stack.to_string(), logical.to_string()), physical.to_string());
            self
        }
    }

    #[async_trait]
    impl StackDescriber for FakeStacks {
        async fn describe_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((stack.to_string(), logical_id.to_string()));
            if self.unavailable {
                return Err(ProviderError::BackendUnavailable("throttled".to_string()));
            }
            self.resources
                .get(&(stack.to_string(), logical_id.to_string()))
                .cloned()
                .ok_or_else(|| ProviderError::StackResourceNotFound {
                    stack: stack.to_string(),
                    resource: logical_id.to_string(),
                })
        }
    }

    fn build(stacks: FakeStacks) -> (Arc<FakeStacks>, ResourceResolver) {
        let stacks = Arc::new(stacks);
        (stacks.clone(), ResourceResolver::new("prod", stacks))
    }

    #[tokio::test]
    async fn test_rack_resource() {
        let (_, resolver) = build(FakeStacks::default().with("prod", "Cluster", "prod-Cluster-1A"));
        assert_eq!(
            resolver.resolve_rack_resource("Cluster").await.unwrap(),
            "prod-Cluster-1A"
        );
    }

    #[tokio::test]
    async fn test_app_resource_matches_stack_resource() {
        let (stacks, resolver) =
            build(FakeStacks::default().with("prod-web", "Repository", "prod-web-repo-x9"));

        let via_app = resolver.resolve_app_resource("web", "Repository").await.unwrap();
        let via_stack = resolver
            .resolve_stack_resource("prod-web", "Repository")
            .await
            .unwrap();

        assert_eq!(via_app, via_stack);
        let calls = stacks.calls.lock().unwrap();
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_every_resolution_queries_backend() {
        let (stacks, resolver) = build(FakeStacks::default().with("prod", "Bucket", "b-1"));
        resolver.resolve_rack_resource("Bucket").await.unwrap();
        resolver.resolve_rack_resource("Bucket").await.unwrap();
        assert_eq!(stacks.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let (_, resolver) = build(FakeStacks::default());
        let err = resolver.resolve_app_resource("web", "Repository").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_backend_failure_is_surfaced() {
        let (_, resolver) = build(FakeStacks {
            unavailable: true,
            ..Default::default()
        });
        let err = resolver.resolve_rack_resource("Cluster").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_blank_input_never_reaches_backend() {
        let (stacks, resolver) = build(FakeStacks::default());
        assert!(resolver.resolve_stack_resource("", "Cluster").await.is_err());
        assert!(resolver.resolve_stack_resource("prod", "").await.is_err());
        assert!(resolver.resolve_app_resource("web-api", "Cluster").await.is_err());
        assert!(stacks.calls.lock().unwrap().is_empty());
    }
}
