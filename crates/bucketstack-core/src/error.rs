//! Provisioning error types.
//!
//! Every variant echoes the input that caused it so the operator can see what
//! to fix. All of them abort the run before any descriptor is emitted.
//!
//! # Usage
//!
//! ```
//! use bucketstack_core::error::ProvisionError;
//!
//! let err = ProvisionError::InvalidName {
//!     name: "Bad_Name".to_owned(),
//!     reason: "uppercase".to_owned(),
//! };
//! assert!(err.to_string().contains("Bad_Name"));
//! ```

/// Error raised while computing the stack description.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A configuration value could not be parsed.
    #[error("invalid configuration value for {key}: {value:?}: {reason}")]
    ConfigParse {
        /// The configuration key.
        key: String,
        /// The raw value that failed to parse.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The composed bucket name violates the storage service naming rules.
    #[error("invalid bucket name: {name:?}: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// The violated rule.
        reason: String,
    },

    /// The asset source directory is missing or unreadable.
    #[error("asset source not found: {path}: {reason}")]
    AssetSourceNotFound {
        /// The asset source path as given.
        path: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Convenience result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
