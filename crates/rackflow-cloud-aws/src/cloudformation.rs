//! CloudFormation-backed stack resolution
//!
//! `DescribeStackResource` answers physical ids; `DescribeStacks` answers
//! whether an app's stack exists. SDK errors are reduced to the provider
//! taxonomy by [`classify`].

use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use rackflow_cloud::{AppRegistry, ProviderError, Result, StackDescriber, naming};

/// Error code CloudFormation returns for missing stacks and resources
const VALIDATION_ERROR: &str = "ValidationError";

/// Map a CloudFormation error onto the provider taxonomy
///
/// Only a `ValidationError` saying the target "does not exist" is a lookup
/// miss. Everything else (credentials, throttling, transport) means the call
/// could not complete.
pub fn classify(
    stack: &str,
    resource: &str,
    code: Option<&str>,
    message: Option<&str>,
    detail: String,
) -> ProviderError {
    let missing = code == Some(VALIDATION_ERROR)
        && message.is_some_and(|m| m.contains("does not exist"));

    if missing {
        ProviderError::StackResourceNotFound {
            stack: stack.to_string(),
            resource: resource.to_string(),
        }
    } else {
        ProviderError::BackendUnavailable(detail)
    }
}

/// CloudFormation client wrapper
#[derive(Debug, Clone)]
pub struct CloudFormationStacks {
    client: Client,
}

impl CloudFormationStacks {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Whether `stack` exists in the account and region
    pub async fn stack_exists(&self, stack: &str) -> Result<bool> {
        tracing::debug!(stack = %stack, "DescribeStacks");

        match self.client.describe_stacks().stack_name(stack).send().await {
            Ok(output) => Ok(!output.stacks().is_empty()),
            Err(err) => match classify(
                stack,
                "",
                err.code(),
                err.message(),
                DisplayErrorContext(&err).to_string(),
            ) {
                ProviderError::StackResourceNotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl StackDescriber for CloudFormationStacks {
    async fn describe_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String> {
        tracing::debug!(stack = %stack, logical_id = %logical_id, "DescribeStackResource");

        let output = self
            .client
            .describe_stack_resource()
            .stack_name(stack)
            .logical_resource_id(logical_id)
            .send()
            .await
            .map_err(|err| {
                classify(
                    stack,
                    logical_id,
                    err.code(),
                    err.message(),
                    DisplayErrorContext(&err).to_string(),
                )
            })?;

        output
            .stack_resource_detail()
            .and_then(|detail| detail.physical_resource_id())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::StackResourceNotFound {
                stack: stack.to_string(),
                resource: logical_id.to_string(),
            })
    }
}

/// Apps are the `{rack}-{app}` stacks
#[derive(Debug, Clone)]
pub struct StackApps {
    rack: String,
    stacks: CloudFormationStacks,
}

impl StackApps {
    pub fn new(rack: impl Into<String>, stacks: CloudFormationStacks) -> Self {
        Self {
            rack: rack.into(),
            stacks,
        }
    }
}

#[async_trait]
impl AppRegistry for StackApps {
    async fn app_exists(&self, app: &str) -> Result<()> {
        let Ok(stack) = naming::app_stack_name(&self.rack, app) else {
            return Err(ProviderError::AppNotFound(app.to_string()));
        };

        if self.stacks.stack_exists(&stack).await? {
            Ok(())
        } else {
            Err(ProviderError::AppNotFound(app.to_string()))
        }
    }
}
