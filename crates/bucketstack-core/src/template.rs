//! CloudFormation-style rendering of a [`ProvisionedStack`].
//!
//! The rendered document is what the provisioning engine consumes. It holds
//! three resources and one output:
//!
//! | Logical ID | Type |
//! |------------|------|
//! | `Bucket` | `AWS::S3::Bucket` |
//! | `BucketPolicy` | `AWS::S3::BucketPolicy` |
//! | `DeployAssets` | `Custom::BucketDeployment` |
//! | `S3BucketArn` (output) | `Fn::GetAtt Bucket.Arn` |

use serde_json::{Map, Value, json};

use crate::bucket::BucketConfig;
use crate::deployment::DeploymentManifest;
use crate::provisioner::{ProvisionedStack, StackOutput};

/// Logical ID of the bucket resource.
pub const BUCKET_ID: &str = "Bucket";

/// Logical ID of the bucket policy resource.
pub const BUCKET_POLICY_ID: &str = "BucketPolicy";

/// Logical ID of the asset deployment resource.
pub const DEPLOYMENT_ID: &str = "DeployAssets";

/// Render the template document for `stack`.
///
/// The result is deterministic: the same stack always renders the same
/// document.
#[must_use]
pub fn render_template(stack: &ProvisionedStack) -> Value {
    let mut metadata = json!({
        "StackName": stack.identity.stack_name(),
        "Region": stack.identity.region.as_str(),
    });
    if let Some(account) = &stack.identity.account {
        metadata["Account"] = json!(account.as_str());
    }

    let mut resources = Map::new();
    resources.insert(BUCKET_ID.to_owned(), render_bucket(&stack.bucket));
    resources.insert(
        BUCKET_POLICY_ID.to_owned(),
        json!({
            "Type": "AWS::S3::BucketPolicy",
            "Properties": {
                "Bucket": { "Ref": BUCKET_ID },
                "PolicyDocument": stack.policy,
            },
        }),
    );
    resources.insert(DEPLOYMENT_ID.to_owned(), render_deployment(&stack.deployment));

    let mut outputs = Map::new();
    outputs.insert(
        StackOutput::NAME.to_owned(),
        json!({
            "Description": StackOutput::DESCRIPTION,
            "Value": { "Fn::GetAtt": [BUCKET_ID, "Arn"] },
        }),
    );

    json!({
        "Description": format!("{} (IP restricted asset bucket)", stack.identity.stack_name()),
        "Metadata": metadata,
        "Resources": resources,
        "Outputs": outputs,
    })
}

fn render_bucket(bucket: &BucketConfig) -> Value {
    let cors_rules: Vec<Value> = bucket
        .cors_rules
        .iter()
        .map(|rule| {
            json!({
                "AllowedHeaders": rule.allowed_headers,
                "AllowedMethods": rule.allowed_methods,
                "AllowedOrigins": rule.allowed_origins,
            })
        })
        .collect();
    let block = bucket.public_access_block;
    let deletion_policy = bucket.removal_policy.as_deletion_policy();

    json!({
        "Type": "AWS::S3::Bucket",
        "Properties": {
            "BucketName": bucket.name,
            "CorsConfiguration": { "CorsRules": cors_rules },
            "PublicAccessBlockConfiguration": {
                "BlockPublicAcls": block.block_public_acls,
                "BlockPublicPolicy": block.block_public_policy,
                "IgnorePublicAcls": block.ignore_public_acls,
                "RestrictPublicBuckets": block.restrict_public_buckets,
            },
        },
        "UpdateReplacePolicy": deletion_policy,
        "DeletionPolicy": deletion_policy,
    })
}

fn render_deployment(deployment: &DeploymentManifest) -> Value {
    json!({
        "Type": "Custom::BucketDeployment",
        "Properties": {
            "SourcePath": deployment.source_path.display().to_string(),
            "SourceFingerprint": deployment.fingerprint,
            "SourceObjectKeys": deployment.objects.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
            "DestinationBucketName": { "Ref": BUCKET_ID },
            "Prune": deployment.prune,
        },
        "DependsOn": [BUCKET_POLICY_ID],
    })
}
