//! AWS backend for rackflow
//!
//! - stack resources via CloudFormation `DescribeStackResource`
//! - apps are the `{rack}-{app}` stacks (`DescribeStacks`)
//! - caller identity via STS `GetCallerIdentity`
//! - objects in the rack's `Settings` bucket under `apps/{app}/objects/{key}`
//!
//! Credentials come from the standard AWS provider chain.
//!
//! # Example
//!
//! ```ignore
//! use rackflow_cloud::{Provider, ProviderConfig};
//! use rackflow_cloud_aws::AwsProvider;
//!
//! let config = ProviderConfig::from_env()?;
//! let aws = AwsProvider::connect(&config).await;
//! let provider = Provider::new(config, aws.services());
//!
//! let address = provider.app_repository_address("web").await?;
//! ```

pub mod cloudformation;
pub mod identity;
pub mod provider;
pub mod s3;

pub use cloudformation::{CloudFormationStacks, StackApps, classify};
pub use identity::StsIdentity;
pub use provider::{AwsProvider, FORMATION, FORMATION_SUFFIX};
pub use s3::{MAX_OBJECT_SIZE, S3Storage};
