//! AWS SDK implementations of the storage and role-assumption capabilities.
//!
//! The SDK is async; the pipeline is a sequence of blocking steps, so each call
//! parks the current worker with `block_in_place`. Requires a multi-threaded
//! tokio runtime.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_sts::primitives::DateTimeFormat;
use s3_sample_core::export::CSV_CONTENT_TYPE;

use crate::adapters::credentials::{CredentialSet, RoleAssumer};
use crate::adapters::object_store::ObjectStore;

const ASSUMED_ROLE_PROVIDER: &str = "s3-sample-assumed-role";

pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }

    /// Client from the ambient SDK config, or bound to assumed-role credentials when given.
    pub fn from_sdk_config(sdk_config: &SdkConfig, credentials: Option<CredentialSet>) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(credentials) = credentials {
            builder = builder.credentials_provider(aws_sdk_s3::config::Credentials::new(
                credentials.access_key_id,
                credentials.secret_access_key,
                Some(credentials.session_token),
                None,
                ASSUMED_ROLE_PROVIDER,
            ));
        }
        Self::new(aws_sdk_s3::Client::from_conf(builder.build()))
    }
}

impl ObjectStore for S3ObjectStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .content_type(CSV_CONTENT_TYPE)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| aws_sdk_s3::error::DisplayErrorContext(&error).to_string())
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct StsRoleAssumer {
    sts_client: aws_sdk_sts::Client,
}

impl StsRoleAssumer {
    pub fn new(sts_client: aws_sdk_sts::Client) -> Self {
        Self { sts_client }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self::new(aws_sdk_sts::Client::new(sdk_config))
    }
}

impl RoleAssumer for StsRoleAssumer {
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<CredentialSet, String> {
        let role_arn = role_arn.to_string();
        let session_name = session_name.to_string();
        let client = self.sts_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .assume_role()
                    .role_arn(role_arn)
                    .role_session_name(session_name)
                    .send()
                    .await
                    .map_err(|error| {
                        aws_sdk_sts::error::DisplayErrorContext(&error).to_string()
                    })?;

                let credentials = output
                    .credentials()
                    .ok_or_else(|| "AssumeRole response did not include credentials".to_string())?;

                Ok(CredentialSet {
                    access_key_id: credentials.access_key_id().to_string(),
                    secret_access_key: credentials.secret_access_key().to_string(),
                    session_token: credentials.session_token().to_string(),
                    expiration: credentials
                        .expiration()
                        .fmt(DateTimeFormat::DateTime)
                        .ok(),
                })
            })
        })
    }
}
