//! Simulated stacks
//!
//! Each stack is a JSON file `stacks/{stack}.json` mapping logical resource
//! ids to physical ids. Stacks are created from rendered formation documents;
//! physical ids are derived from the stack and logical id so re-creating a
//! stack yields the same identifiers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rackflow_cloud::{ProviderError, Result, StackDescriber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STACK_VERSION: u32 = 1;
const STACK_DIR: &str = "stacks";

/// Persisted stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    /// Record format version
    pub version: u32,
    pub name: String,
    /// logical id -> physical id
    pub resources: BTreeMap<String, String>,
    pub updated_at: DateTime<Utc>,
}

/// Stack store under the storage root
#[derive(Debug, Clone)]
pub struct LocalStacks {
    root: PathBuf,
}

impl LocalStacks {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn stack_path(&self, stack: &str) -> PathBuf {
        self.root.join(STACK_DIR).join(format!("{stack}.json"))
    }

    /// Physical id assigned to `logical_id` in `stack`
    pub fn physical_id(stack: &str, logical_id: &str) -> String {
        format!("{}-{}", stack, logical_id.to_ascii_lowercase())
    }

    /// Create or replace `stack` from a formation document with a
    /// top-level `Resources` object
    pub async fn create_stack(&self, stack: &str, document: &str) -> Result<StackRecord> {
        if stack.is_empty() || stack.contains('/') {
            return Err(ProviderError::InvalidInput(format!(
                "invalid stack name: {stack:?}"
            )));
        }

        let document: serde_json::Value = serde_json::from_str(document)?;
        let resources = document
            .get("Resources")
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| {
                ProviderError::InvalidInput("formation document has no Resources".to_string())
            })?;

        let record = StackRecord {
            version: STACK_VERSION,
            name: stack.to_string(),
            resources: resources
                .keys()
                .map(|logical| (logical.clone(), Self::physical_id(stack, logical)))
                .collect(),
            updated_at: Utc::now(),
        };

        let path = self.stack_path(stack);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, serde_json::to_string_pretty(&record)?).await?;

        tracing::info!(stack = %stack, resources = record.resources.len(), "Created stack");
        Ok(record)
    }

    /// Load a stack; `None` when it does not exist
    pub async fn load(&self, stack: &str) -> Result<Option<StackRecord>> {
        if stack.contains('/') {
            return Ok(None);
        }

        let content = match fs::read_to_string(self.stack_path(stack)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProviderError::Io(e)),
        };

        let record: StackRecord = serde_json::from_str(&content)?;
        if record.version > STACK_VERSION {
            return Err(ProviderError::InvalidConfig(format!(
                "stack {} has version {} newer than supported version {}",
                stack, record.version, STACK_VERSION
            )));
        }
        Ok(Some(record))
    }
}

#[async_trait]
impl StackDescriber for LocalStacks {
    async fn describe_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String> {
        tracing::debug!(stack = %stack, logical_id = %logical_id, "Describing local stack resource");

        self.load(stack)
            .await?
            .and_then(|record| record.resources.get(logical_id).cloned())
            .ok_or_else(|| ProviderError::StackResourceNotFound {
                stack: stack.to_string(),
                resource: logical_id.to_string(),
            })
    }
}
