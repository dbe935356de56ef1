//! Composition of the bucket, policy and deployment descriptors.
//!
//! [`BucketProvisioner`] is the entry point of the crate. It holds the
//! [`StackIdentity`] and turns a [`ProvisionRequest`] into a
//! [`ProvisionedStack`]. Validation is fail-fast: the first error aborts
//! the run and nothing is returned.
//!
//! ```text
//! ProvisionRequest
//!        |
//!        v
//! compute_bucket_name -> build_bucket_config
//!        |
//!        v
//! build_ip_restricted_policy -> PolicyDocument
//!        |
//!        v
//! build_deployment_manifest
//!        |
//!        v
//! ProvisionedStack { bucket, policy, deployment, output }
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bucket::{BucketConfig, bucket_arn, build_bucket_config, compute_bucket_name};
use crate::config::ProvisionRequest;
use crate::deployment::{DeploymentManifest, build_deployment_manifest};
use crate::error::ProvisionError;
use crate::policy::{PolicyDocument, build_ip_restricted_policy};
use crate::types::StackIdentity;

/// Output record exposed to operators and downstream automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutput {
    /// ARN of the provisioned bucket.
    pub bucket_arn: String,
}

impl StackOutput {
    /// Logical name of the output.
    pub const NAME: &str = "S3BucketArn";

    /// Human readable description of the output.
    pub const DESCRIPTION: &str = "S3 bucket Arn";
}

/// Everything the engine needs to apply the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedStack {
    /// Naming and environment context.
    pub identity: StackIdentity,
    /// Desired bucket state.
    pub bucket: BucketConfig,
    /// Resource policy attached to the bucket.
    pub policy: PolicyDocument,
    /// Asset sync binding.
    pub deployment: DeploymentManifest,
    /// Output record.
    pub output: StackOutput,
}

/// Computes the stack description for one identity.
#[derive(Debug, Clone)]
pub struct BucketProvisioner {
    identity: StackIdentity,
}

impl BucketProvisioner {
    /// Create a provisioner for `identity`.
    #[must_use]
    pub fn new(identity: StackIdentity) -> Self {
        Self { identity }
    }

    /// The identity this provisioner names resources with.
    #[must_use]
    pub fn identity(&self) -> &StackIdentity {
        &self.identity
    }

    /// Compute the full stack description.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidName`] if the bucket name is invalid
    /// and [`ProvisionError::AssetSourceNotFound`] if the asset directory is
    /// missing or unreadable.
    pub fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionedStack, ProvisionError> {
        let name = compute_bucket_name(&self.identity, &request.bucket_name)?;
        let arn = bucket_arn(&self.identity, &name);

        let bucket = build_bucket_config(&name, request.removal_policy);

        let mut policy = PolicyDocument::default();
        policy.add_statement(build_ip_restricted_policy(&arn, &request.allow_list));

        let deployment = build_deployment_manifest(&request.asset_source, &name)?;

        info!(
            stack = %self.identity.stack_name(),
            bucket = %name,
            region = %self.identity.region,
            allow_list = request.allow_list.len(),
            assets = deployment.objects.len(),
            "computed stack description"
        );

        Ok(ProvisionedStack {
            identity: self.identity.clone(),
            bucket,
            policy,
            deployment,
            output: StackOutput { bucket_arn: arn },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::bucket::RemovalPolicy;
    use crate::config::StackConfig;
    use crate::types::AwsRegion;

    fn identity() -> StackIdentity {
        StackIdentity {
            prefix: "acme".to_owned(),
            stage: "dev".to_owned(),
            account: None,
            region: AwsRegion::default(),
        }
    }

    fn request(asset_source: PathBuf, allow_list: &[&str]) -> ProvisionRequest {
        ProvisionRequest {
            bucket_name: "assets".to_owned(),
            allow_list: allow_list.iter().map(|&s| s.to_owned()).collect(),
            asset_source,
            removal_policy: RemovalPolicy::Destroy,
        }
    }

    #[test]
    fn test_should_provision_end_to_end_from_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();

        let config = StackConfig::builder()
            .prefix("acme".into())
            .stage("dev".into())
            .bucket_name("assets".into())
            .white_list_ip(r#"["10.0.0.0/8"]"#.into())
            .asset_source(dir.path().display().to_string())
            .build();

        let provisioner = BucketProvisioner::new(config.identity());
        let stack = provisioner.provision(&config.request().unwrap()).unwrap();

        assert_eq!(stack.bucket.name, "acme-dev-assets-bucket");
        assert_eq!(stack.policy.statement.len(), 1);
        assert_eq!(
            stack.policy.statement[0].source_ips().unwrap(),
            ["10.0.0.0/8"]
        );
        assert_eq!(stack.deployment.objects.len(), 1);
        assert_eq!(stack.deployment.destination_bucket, stack.bucket.name);
        assert_eq!(stack.output.bucket_arn, "arn:aws:s3:::acme-dev-assets-bucket");
    }

    #[test]
    fn test_should_scope_policy_to_bucket_objects() {
        let dir = tempfile::tempdir().unwrap();
        let stack = BucketProvisioner::new(identity())
            .provision(&request(dir.path().to_path_buf(), &["10.0.0.0/8"]))
            .unwrap();
        assert_eq!(
            stack.policy.statement[0].resource,
            vec![format!("{}/*", stack.output.bucket_arn)]
        );
    }

    #[test]
    fn test_should_keep_empty_allow_list_permission_less() {
        let dir = tempfile::tempdir().unwrap();
        let stack = BucketProvisioner::new(identity())
            .provision(&request(dir.path().to_path_buf(), &[]))
            .unwrap();
        assert!(stack.policy.statement[0].source_ips().unwrap().is_empty());
    }

    #[test]
    fn test_should_fail_fast_on_invalid_name() {
        let mut id = identity();
        id.prefix = "Bad_Prefix".to_owned();
        // The asset directory is missing too; the name error wins.
        let result = BucketProvisioner::new(id)
            .provision(&request(PathBuf::from("/no/such/assets"), &[]));
        assert!(matches!(result, Err(ProvisionError::InvalidName { .. })));
    }

    #[test]
    fn test_should_fail_on_missing_asset_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = BucketProvisioner::new(identity())
            .provision(&request(dir.path().join("missing"), &["10.0.0.0/8"]));
        assert!(matches!(
            result,
            Err(ProvisionError::AssetSourceNotFound { .. })
        ));
    }

    #[test]
    fn test_should_use_partition_of_region_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut id = identity();
        id.region = AwsRegion::new("us-gov-west-1");
        let stack = BucketProvisioner::new(id)
            .provision(&request(dir.path().to_path_buf(), &[]))
            .unwrap();
        assert_eq!(
            stack.output.bucket_arn,
            "arn:aws-us-gov:s3:::acme-dev-assets-bucket"
        );
    }
}
