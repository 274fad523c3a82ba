//! Declarative resource graph for the s3-sample data pipeline.
//!
//! The graph is a KMS key, an S3 bucket encrypted with it, an IAM role granted
//! read/write on the bucket and encrypt/decrypt on the key, and two SSM
//! parameters publishing the bucket name and role ARN. It renders to an AWS
//! CloudFormation template; submitting that template is left to the
//! provisioning tooling.

pub mod resources;
pub mod stack;
pub mod template;

pub use resources::{BucketHandle, KeyHandle, RemovalPolicy, ResourceNode, RoleHandle};
pub use stack::{SampleStack, StackProps, TagContext};
pub use template::Template;
