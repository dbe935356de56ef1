//! Account, region and naming context shared by every builder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns [`ProvisionError::ConfigParse`] if the account ID is not a
    /// 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, ProvisionError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProvisionError::ConfigParse {
                key: "CDK_ACCOUNT".to_owned(),
                value: id,
                reason: "account ID must be a 12-digit numeric string".to_owned(),
            });
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when `CDK_REGION` is not set.
    pub const DEFAULT: &str = "ap-southeast-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ARN partition this region belongs to.
    #[must_use]
    pub fn partition(&self) -> Partition {
        if self.0.starts_with("cn-") {
            Partition::China
        } else if self.0.starts_with("us-gov-") {
            Partition::GovCloud
        } else {
            Partition::Standard
        }
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ARN partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// `aws`
    Standard,
    /// `aws-cn`
    China,
    /// `aws-us-gov`
    GovCloud,
}

impl Partition {
    /// The partition segment as it appears in an ARN.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "aws",
            Self::China => "aws-cn",
            Self::GovCloud => "aws-us-gov",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming and environment context threaded into every builder.
///
/// `account` is `None` when the configured account is not a real account ID
/// (for example the unset placeholder); the stack is then
/// environment-agnostic and the engine resolves the account at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackIdentity {
    /// Naming prefix for all resources.
    pub prefix: String,
    /// Deployment stage identifier.
    pub stage: String,
    /// Target account, if resolved.
    pub account: Option<AccountId>,
    /// Target region.
    pub region: AwsRegion,
}

impl StackIdentity {
    /// Name of the stack, `<prefix>-<stage>-S3BucketStack`.
    #[must_use]
    pub fn stack_name(&self) -> String {
        format!("{}-{}-S3BucketStack", self.prefix, self.stage)
    }
}
