//! AWS backend assembly

use crate::cloudformation::{CloudFormationStacks, StackApps};
use crate::identity::StsIdentity;
use crate::s3::S3Storage;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use rackflow_cloud::{BackendServices, NamespacedObjectStore, ProviderConfig, ResourceResolver};
use std::sync::Arc;

/// Suffix of formation template files
pub const FORMATION_SUFFIX: &str = ".json.tmpl";

/// Formation templates compiled into the binary
pub const FORMATION: &[(&str, &str)] = &[
    ("app", include_str!("../formation/app.json.tmpl")),
    ("rack", include_str!("../formation/rack.json.tmpl")),
];

/// SDK clients for one rack, built once from the shared SDK config
pub struct AwsProvider {
    sdk: SdkConfig,
    rack: String,
    objects_resource: String,
    stacks: CloudFormationStacks,
}

impl AwsProvider {
    /// Load credentials and region from the environment, with the configured
    /// region taking precedence
    pub async fn connect(config: &ProviderConfig) -> Self {
        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self::from_sdk_config(config, sdk)
    }

    pub fn from_sdk_config(config: &ProviderConfig, sdk: SdkConfig) -> Self {
        tracing::debug!(region = %config.region, rack = %config.rack, "Using aws backend");

        let stacks = CloudFormationStacks::new(aws_sdk_cloudformation::Client::new(&sdk));
        Self {
            sdk,
            rack: config.rack.clone(),
            objects_resource: config.objects_resource.clone(),
            stacks,
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk
    }

    pub fn stacks(&self) -> &CloudFormationStacks {
        &self.stacks
    }

    pub fn services(&self) -> BackendServices {
        let stacks = Arc::new(self.stacks.clone());
        let storage = S3Storage::from_rack_resource(
            aws_sdk_s3::Client::new(&self.sdk),
            ResourceResolver::new(self.rack.clone(), stacks.clone()),
            self.objects_resource.clone(),
        );

        BackendServices {
            stacks: stacks.clone(),
            identity: Arc::new(StsIdentity::new(aws_sdk_sts::Client::new(&self.sdk))),
            objects: Arc::new(NamespacedObjectStore::new(
                Arc::new(StackApps::new(self.rack.clone(), self.stacks.clone())),
                Arc::new(storage),
            )),
            network: None,
            templates: FORMATION,
            template_suffix: FORMATION_SUFFIX.to_string(),
        }
    }
}
