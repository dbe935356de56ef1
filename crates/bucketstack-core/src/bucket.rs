//! Desired state of the asset bucket.
//!
//! [`BucketConfig`] carries the name, CORS rules, public access block and
//! removal policy that the provisioning engine applies to the bucket.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProvisionError;
use crate::types::StackIdentity;
use crate::validation::{validate_bucket_name, validate_name_segment};

// ---------------------------------------------------------------------------
// Supporting configuration types
// ---------------------------------------------------------------------------

/// HTTP methods a CORS rule can allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
}

impl HttpMethod {
    /// Return the method as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CORS rule configuration stored on a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsRuleConfig {
    /// Origins that are allowed to make cross-domain requests.
    pub allowed_origins: Vec<String>,
    /// HTTP methods that the origin is allowed to execute.
    pub allowed_methods: Vec<HttpMethod>,
    /// Headers that are allowed in a pre-flight `OPTIONS` request.
    pub allowed_headers: Vec<String>,
}

/// Public access block configuration for a bucket.
///
/// AWS defines exactly four boolean fields for this configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublicAccessBlockConfig {
    /// Whether Amazon S3 should block public ACLs for this bucket.
    pub block_public_acls: bool,
    /// Whether Amazon S3 should ignore public ACLs for this bucket.
    pub ignore_public_acls: bool,
    /// Whether Amazon S3 should block public bucket policies.
    pub block_public_policy: bool,
    /// Whether Amazon S3 should restrict public bucket policies.
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfig {
    /// All four flags set.
    pub const BLOCK_ALL: Self = Self {
        block_public_acls: true,
        ignore_public_acls: true,
        block_public_policy: true,
        restrict_public_buckets: true,
    };

    /// Whether every form of public access is blocked.
    #[must_use]
    pub fn blocks_all(&self) -> bool {
        *self == Self::BLOCK_ALL
    }
}

/// What happens to the bucket when the stack is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalPolicy {
    /// Delete the bucket on teardown. Fails on the engine side if the
    /// bucket still holds objects. Not meant for production stages.
    #[default]
    Destroy,
    /// Keep the bucket in the account after teardown.
    Retain,
}

impl RemovalPolicy {
    /// The deletion policy keyword understood by the engine.
    #[must_use]
    pub fn as_deletion_policy(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
        }
    }
}

/// Error returned when parsing a [`RemovalPolicy`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown removal policy: {0} (expected 'destroy' or 'retain')")]
pub struct ParseRemovalPolicyError(String);

impl FromStr for RemovalPolicy {
    type Err = ParseRemovalPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "destroy" | "delete" => Ok(Self::Destroy),
            "retain" => Ok(Self::Retain),
            _ => Err(ParseRemovalPolicyError(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// BucketConfig
// ---------------------------------------------------------------------------

/// Desired state of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketConfig {
    /// Globally unique bucket name.
    pub name: String,
    /// CORS rules.
    pub cors_rules: Vec<CorsRuleConfig>,
    /// Public access block settings.
    pub public_access_block: PublicAccessBlockConfig,
    /// Teardown behavior.
    pub removal_policy: RemovalPolicy,
}

/// Compose the bucket name `<prefix>-<stage>-<suffix>-bucket`, lowercased.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidName`] if a segment is empty or the
/// composed name breaks the S3 naming rules.
///
/// # Examples
///
/// ```
/// use bucketstack_core::bucket::compute_bucket_name;
/// use bucketstack_core::types::{AwsRegion, StackIdentity};
///
/// let identity = StackIdentity {
///     prefix: "Acme".to_owned(),
///     stage: "DEV".to_owned(),
///     account: None,
///     region: AwsRegion::default(),
/// };
/// let name = compute_bucket_name(&identity, "Assets").unwrap();
/// assert_eq!(name, "acme-dev-assets-bucket");
/// ```
pub fn compute_bucket_name(
    identity: &StackIdentity,
    suffix: &str,
) -> Result<String, ProvisionError> {
    let name = format!(
        "{}-{}-{}-bucket",
        identity.prefix.to_lowercase(),
        identity.stage.to_lowercase(),
        suffix.to_lowercase()
    );

    validate_name_segment(&name, "PREFIX", &identity.prefix)?;
    validate_name_segment(&name, "STAGE", &identity.stage)?;
    validate_name_segment(&name, "BUCKET_NAME", suffix)?;
    validate_bucket_name(&name)?;

    debug!(bucket = %name, "computed bucket name");
    Ok(name)
}

/// Build the bucket descriptor.
///
/// CORS allows GET, PUT, POST, DELETE and HEAD from any origin with any
/// header. Public access is always fully blocked; reads go through the
/// resource policy only.
#[must_use]
pub fn build_bucket_config(name: &str, removal_policy: RemovalPolicy) -> BucketConfig {
    BucketConfig {
        name: name.to_owned(),
        cors_rules: vec![CorsRuleConfig {
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: vec![
                HttpMethod::Get,
                HttpMethod::Put,
                HttpMethod::Post,
                HttpMethod::Delete,
                HttpMethod::Head,
            ],
            allowed_headers: vec!["*".to_owned()],
        }],
        public_access_block: PublicAccessBlockConfig::BLOCK_ALL,
        removal_policy,
    }
}

/// ARN of a bucket, `arn:<partition>:s3:::<name>`.
#[must_use]
pub fn bucket_arn(identity: &StackIdentity, name: &str) -> String {
    format!("arn:{}:s3:::{name}", identity.region.partition())
}
