//! Bucket resource policy construction.
//!
//! The stack attaches a single statement to the bucket policy that lets any
//! principal read and list objects, but only from the configured source
//! address ranges. Serialized documents use the IAM JSON policy grammar.

use std::collections::BTreeMap;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Actions granted to allow-listed callers.
pub const READ_LIST_ACTIONS: [&str; 2] = ["s3:Get*", "s3:List*"];

/// Condition operator used for the source address check.
pub const IP_ADDRESS_OPERATOR: &str = "IpAddress";

/// Condition key carrying the caller's address.
pub const SOURCE_IP_KEY: &str = "aws:SourceIp";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Grant the listed actions.
    Allow,
    /// Refuse the listed actions.
    Deny,
}

/// Principal a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// `*` for anyone.
    #[serde(rename = "AWS")]
    pub aws: String,
}

impl Principal {
    /// Any principal.
    #[must_use]
    pub fn any() -> Self {
        Self {
            aws: "*".to_owned(),
        }
    }
}

/// `operator -> key -> values`, as in `{"IpAddress": {"aws:SourceIp": [..]}}`.
pub type ConditionBlock = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// A single authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Allow or deny.
    pub effect: Effect,
    /// Who the statement applies to.
    pub principal: Principal,
    /// Granted actions.
    pub action: Vec<String>,
    /// Resource ARN patterns.
    pub resource: Vec<String>,
    /// Conditions that must all hold.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub condition: ConditionBlock,
}

impl PolicyStatement {
    /// Add a condition, appending values if the operator/key pair exists.
    pub fn add_condition(&mut self, operator: &str, key: &str, values: &[String]) {
        self.condition
            .entry(operator.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .extend(values.iter().cloned());
    }

    /// Source address ranges this statement is restricted to, in order.
    ///
    /// Returns `None` when the statement carries no source address condition.
    #[must_use]
    pub fn source_ips(&self) -> Option<&[String]> {
        self.condition
            .get(IP_ADDRESS_OPERATOR)
            .and_then(|c| c.get(SOURCE_IP_KEY))
            .map(Vec::as_slice)
    }
}

/// Resource policy attached to the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Statements, evaluated together.
    pub statement: Vec<PolicyStatement>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION.to_owned(),
            statement: Vec::new(),
        }
    }
}

impl PolicyDocument {
    /// Append a statement. Existing statements are kept.
    pub fn add_statement(&mut self, statement: PolicyStatement) {
        self.statement.push(statement);
    }
}

/// Build the read/list statement restricted to `allow_list`.
///
/// The statement covers every object under `bucket_arn`. The allow-list is
/// copied verbatim and in order. An empty allow-list yields an empty
/// `aws:SourceIp` set, which matches no caller: the statement then grants
/// nothing. It is never widened to "any address".
///
/// # Examples
///
/// ```
/// use bucketstack_core::policy::build_ip_restricted_policy;
///
/// let stmt = build_ip_restricted_policy(
///     "arn:aws:s3:::acme-dev-assets-bucket",
///     &["10.0.0.0/8".to_owned()],
/// );
/// assert_eq!(stmt.resource, vec!["arn:aws:s3:::acme-dev-assets-bucket/*"]);
/// assert_eq!(stmt.source_ips().unwrap(), ["10.0.0.0/8"]);
/// ```
#[must_use]
pub fn build_ip_restricted_policy(bucket_arn: &str, allow_list: &[String]) -> PolicyStatement {
    if allow_list.is_empty() {
        warn!(
            bucket_arn,
            "source IP allow-list is empty, the bucket policy statement grants no access"
        );
    }
    for entry in allow_list {
        if !is_ip_or_cidr(entry) {
            warn!(entry = %entry, "allow-list entry is not an IP address or CIDR block");
        }
    }

    let mut statement = PolicyStatement {
        effect: Effect::Allow,
        principal: Principal::any(),
        action: READ_LIST_ACTIONS.iter().map(|&a| a.to_owned()).collect(),
        resource: vec![format!("{bucket_arn}/*")],
        condition: ConditionBlock::new(),
    };
    statement.add_condition(IP_ADDRESS_OPERATOR, SOURCE_IP_KEY, allow_list);

    debug!(
        bucket_arn,
        ranges = allow_list.len(),
        "built IP restricted policy statement"
    );
    statement
}

fn is_ip_or_cidr(entry: &str) -> bool {
    entry.parse::<IpNet>().is_ok() || entry.parse::<IpAddr>().is_ok()
}
