//! Stack configuration.
//!
//! Provides [`StackConfig`], loaded from environment variables with
//! placeholder defaults, and [`ProvisionRequest`], the validated inputs
//! handed to the provisioner. Parsing happens here, before any resource is
//! computed, so a malformed value never yields partial output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::bucket::RemovalPolicy;
use crate::error::ProvisionError;
use crate::types::{AccountId, AwsRegion, StackIdentity};

/// Raw stack configuration.
///
/// Every field holds the value as configured; nothing is validated until
/// [`StackConfig::identity`] and [`StackConfig::request`] are called.
///
/// # Examples
///
/// ```
/// use bucketstack_core::config::StackConfig;
///
/// let config = StackConfig::default();
/// assert_eq!(config.region, "ap-southeast-1");
/// assert_eq!(config.white_list_ip, "[]");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    /// Naming prefix for all resources.
    #[builder(default = String::from("[STACK PREFIX NAME]"))]
    pub prefix: String,

    /// Deployment stage identifier.
    #[builder(default = String::from("[DEPLOYMENT STAGE]"))]
    pub stage: String,

    /// Target account identifier.
    #[builder(default = String::from("[AWS ACCOUNT ID]"))]
    pub account_id: String,

    /// Target region identifier.
    #[builder(default = String::from(AwsRegion::DEFAULT))]
    pub region: String,

    /// User-chosen bucket name suffix.
    #[builder(default)]
    pub bucket_name: String,

    /// JSON array of CIDR strings allowed to read the bucket.
    #[builder(default = String::from("[]"))]
    pub white_list_ip: String,

    /// Local directory deployed into the bucket.
    #[builder(default = String::from("./src/s3"))]
    pub asset_source: String,

    /// `destroy` or `retain`.
    #[builder(default = String::from("destroy"))]
    pub removal_policy: String,

    /// Directory the rendered template is written to.
    #[builder(default = String::from("stack.out"))]
    pub output_dir: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Validated provisioning inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Bucket name suffix.
    pub bucket_name: String,
    /// Allowed source address ranges, in configured order.
    pub allow_list: Vec<String>,
    /// Asset directory.
    pub asset_source: PathBuf,
    /// Teardown behavior of the bucket.
    pub removal_policy: RemovalPolicy,
}

impl StackConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PREFIX` | `[STACK PREFIX NAME]` |
    /// | `STAGE` | `[DEPLOYMENT STAGE]` |
    /// | `CDK_ACCOUNT` | `[AWS ACCOUNT ID]` |
    /// | `CDK_REGION` | `ap-southeast-1` |
    /// | `BUCKET_NAME` | *(empty)* |
    /// | `WHITE_LIST_IP` | `[]` |
    /// | `ASSET_SOURCE` | `./src/s3` |
    /// | `REMOVAL_POLICY` | `destroy` |
    /// | `OUTPUT_DIR` | `stack.out` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("PREFIX") {
            config.prefix = v;
        }
        if let Some(v) = lookup("STAGE") {
            config.stage = v;
        }
        if let Some(v) = lookup("CDK_ACCOUNT") {
            config.account_id = v;
        }
        if let Some(v) = lookup("CDK_REGION") {
            config.region = v;
        }
        if let Some(v) = lookup("BUCKET_NAME") {
            config.bucket_name = v;
        }
        if let Some(v) = lookup("WHITE_LIST_IP") {
            config.white_list_ip = v;
        }
        if let Some(v) = lookup("ASSET_SOURCE") {
            config.asset_source = v;
        }
        if let Some(v) = lookup("REMOVAL_POLICY") {
            config.removal_policy = v;
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            config.output_dir = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The naming and environment context of the stack.
    ///
    /// An account that is not a 12-digit ID leaves the stack
    /// environment-agnostic.
    #[must_use]
    pub fn identity(&self) -> StackIdentity {
        let account = match AccountId::new(self.account_id.as_str()) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "account is not resolved, stack is environment-agnostic");
                None
            }
        };

        StackIdentity {
            prefix: self.prefix.clone(),
            stage: self.stage.clone(),
            account,
            region: AwsRegion::new(self.region.as_str()),
        }
    }

    /// Parse the remaining inputs into a [`ProvisionRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::ConfigParse`] if `WHITE_LIST_IP` is not a
    /// JSON array of strings or `REMOVAL_POLICY` is unknown.
    pub fn request(&self) -> Result<ProvisionRequest, ProvisionError> {
        let allow_list = parse_white_list(&self.white_list_ip)?;
        let removal_policy = self
            .removal_policy
            .parse::<RemovalPolicy>()
            .map_err(|e| ProvisionError::ConfigParse {
                key: "REMOVAL_POLICY".to_owned(),
                value: self.removal_policy.clone(),
                reason: e.to_string(),
            })?;

        Ok(ProvisionRequest {
            bucket_name: self.bucket_name.clone(),
            allow_list,
            asset_source: PathBuf::from(&self.asset_source),
            removal_policy,
        })
    }
}

/// Parse a JSON array of CIDR strings.
///
/// # Errors
///
/// Returns [`ProvisionError::ConfigParse`] echoing the raw value when it is
/// not valid JSON or not an array of strings.
///
/// # Examples
///
/// ```
/// use bucketstack_core::config::parse_white_list;
///
/// let ips = parse_white_list(r#"["10.0.0.0/8"]"#).unwrap();
/// assert_eq!(ips, vec!["10.0.0.0/8"]);
/// assert!(parse_white_list("not-json").is_err());
/// ```
pub fn parse_white_list(raw: &str) -> Result<Vec<String>, ProvisionError> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| ProvisionError::ConfigParse {
        key: "WHITE_LIST_IP".to_owned(),
        value: raw.to_owned(),
        reason: e.to_string(),
    })
}
