//! Bucket, access policy and asset deployment descriptors for BucketStack.
//!
//! This crate computes the desired state of a single static-asset stack: a
//! bucket with CORS rules and all public access blocked, a resource policy
//! that lets allow-listed source addresses read and list objects, and a
//! manifest that syncs a local directory into the bucket. It never talks to
//! the cloud; the computed [`ProvisionedStack`] is rendered into a template
//! and handed to an external provisioning engine.
//!
//! # Architecture
//!
//! ```text
//! StackConfig (environment)
//!        |
//!        v
//! StackIdentity + ProvisionRequest
//!        |
//!        v
//! BucketProvisioner::provision
//!        |
//!        v
//! ProvisionedStack -> render_template -> engine
//! ```

pub mod bucket;
pub mod config;
pub mod deployment;
pub mod error;
pub mod policy;
pub mod provisioner;
pub mod template;
pub mod types;
pub mod validation;

pub use config::{ProvisionRequest, StackConfig};
pub use error::{ProvisionError, ProvisionResult};
pub use provisioner::{BucketProvisioner, ProvisionedStack, StackOutput};
pub use template::render_template;
pub use types::StackIdentity;
