use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::resources::{
    AccessRole, BlockPublicAccess, BucketHandle, EncryptionKey, Grant, KeyHandle,
    ObjectBucket, PublishedParameter, RemovalPolicy, ResourceNode, RoleHandle,
};
use crate::template::Template;

pub const DEFAULT_STACK_NAME: &str = "s3-sample";
pub const DEFAULT_PARAMETER_PREFIX: &str = "/s3-sample";
pub const DEFAULT_KEY_ALIAS: &str = "Keys/S3Sample";
pub const DEFAULT_REPOSITORY_LOCATION: &str = "GitLab";

const KEY_ID: &str = "DataBucketKey";
const BUCKET_ID: &str = "DataBucket";
const ROLE_ID: &str = "CodeLocationRole";
const BUCKET_PARAMETER_ID: &str = "DataBucketNameParameter";
const ROLE_PARAMETER_ID: &str = "CodeLocationRoleArnParameter";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StackProps {
    pub stack_name: String,
    pub description: String,
    pub account: Option<String>,
    pub region: Option<String>,
    pub parameter_prefix: String,
    pub key_alias: String,
    pub removal_policy: RemovalPolicy,
    pub tags: BTreeMap<String, String>,
}

impl Default for StackProps {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            description: "Data bucket, encryption key and access role for the s3-sample pipeline"
                .to_string(),
            account: None,
            region: None,
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
            key_alias: DEFAULT_KEY_ALIAS.to_string(),
            removal_policy: RemovalPolicy::Destroy,
            tags: default_tags(&TagContext::default()),
        }
    }
}

impl StackProps {
    /// Full SSM parameter name under the configured prefix.
    pub fn parameter_name(&self, leaf: &str) -> String {
        let prefix = self.parameter_prefix.trim_end_matches('/');
        if prefix.starts_with('/') || prefix.is_empty() {
            format!("{prefix}/{leaf}")
        } else {
            format!("/{prefix}/{leaf}")
        }
    }
}

/// Provenance and ownership recorded on every taggable resource.
///
/// Unset fields are left off the tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagContext {
    pub repository: Option<String>,
    pub repository_location: Option<String>,
    pub team: Option<String>,
    pub branch: Option<String>,
    pub owner: Option<String>,
}

impl Default for TagContext {
    fn default() -> Self {
        Self {
            repository: None,
            repository_location: Some(DEFAULT_REPOSITORY_LOCATION.to_string()),
            team: None,
            branch: None,
            owner: None,
        }
    }
}

pub fn default_tags(context: &TagContext) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::from([
        ("Name".to_string(), DEFAULT_STACK_NAME.to_string()),
        ("Expiry".to_string(), "never".to_string()),
    ]);
    let optional = [
        ("NameRepository", &context.repository),
        ("RepositoryLocation", &context.repository_location),
        ("NameTeam", &context.team),
        ("DeploymentBranch", &context.branch),
        ("StackOwnerPersonalID", &context.owner),
    ];
    for (key, value) in optional {
        if let Some(value) = value.as_deref().filter(|value| !value.trim().is_empty()) {
            tags.insert(key.to_string(), value.to_string());
        }
    }
    tags
}

/// Resource graph under construction.
///
/// Handles returned by each `define_*` call are required by the next one, so
/// definitions happen in key, bucket, role order.
#[derive(Debug, Clone)]
pub struct SampleStack {
    props: StackProps,
    nodes: Vec<ResourceNode>,
}

impl SampleStack {
    pub fn new(props: StackProps) -> Self {
        Self {
            props,
            nodes: Vec::new(),
        }
    }

    /// Defines the full graph and renders it.
    pub fn synth(props: StackProps) -> Template {
        let mut stack = Self::new(props);
        let key = stack.define_encryption_key();
        let bucket = stack.define_object_bucket(&key);
        stack.define_access_role(&bucket, &key);
        stack.to_template()
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn define_encryption_key(&mut self) -> KeyHandle {
        let handle = KeyHandle::new(KEY_ID);
        self.nodes.push(ResourceNode::EncryptionKey(EncryptionKey {
            handle: handle.clone(),
            alias: self.props.key_alias.clone(),
            enabled: true,
            enable_key_rotation: true,
            removal_policy: self.props.removal_policy,
        }));
        handle
    }

    /// Versioned, KMS-encrypted, TLS-only bucket with every public access block set.
    /// Publishes the generated bucket name as `<prefix>/BucketName`.
    pub fn define_object_bucket(&mut self, key: &KeyHandle) -> BucketHandle {
        let handle = BucketHandle::new(BUCKET_ID);
        self.nodes.push(ResourceNode::ObjectBucket(ObjectBucket {
            handle: handle.clone(),
            encryption_key: key.clone(),
            versioned: true,
            enforce_ssl: true,
            block_public_access: BlockPublicAccess::BLOCK_ALL,
            removal_policy: self.props.removal_policy,
        }));
        self.publish(BUCKET_PARAMETER_ID, "BucketName", handle.bucket_name());
        handle
    }

    /// Role for the pipeline runtime, trusted by the account root.
    /// Publishes the role ARN as `<prefix>/RoleArn`.
    pub fn define_access_role(&mut self, bucket: &BucketHandle, key: &KeyHandle) -> RoleHandle {
        let handle = RoleHandle::new(ROLE_ID);
        self.nodes.push(ResourceNode::AccessRole(AccessRole {
            handle: handle.clone(),
            grants: vec![
                Grant::BucketReadWrite(bucket.clone()),
                Grant::KeyEncryptDecrypt(key.clone()),
            ],
            removal_policy: self.props.removal_policy,
        }));
        self.publish(ROLE_PARAMETER_ID, "RoleArn", handle.arn());
        handle
    }

    pub fn to_template(&self) -> Template {
        let mut resources = serde_json::Map::new();
        for node in &self.nodes {
            for (logical_id, value) in node.render(&self.props.tags) {
                resources.insert(logical_id, value);
            }
        }

        let outputs: serde_json::Map<String, serde_json::Value> = self
            .nodes
            .iter()
            .filter_map(|node| match node {
                ResourceNode::PublishedParameter(parameter) => Some((
                    parameter.logical_id.clone(),
                    json!({
                        "Description": format!("SSM parameter {}", parameter.parameter_name),
                        "Value": { "Ref": parameter.logical_id },
                    }),
                )),
                _ => None,
            })
            .collect();

        let mut metadata = serde_json::Map::new();
        metadata.insert("StackName".to_string(), json!(self.props.stack_name));
        if let Some(account) = &self.props.account {
            metadata.insert("Account".to_string(), json!(account));
        }
        if let Some(region) = &self.props.region {
            metadata.insert("Region".to_string(), json!(region));
        }

        Template::new(json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Description": self.props.description,
            "Metadata": metadata,
            "Resources": resources,
            "Outputs": outputs,
        }))
    }

    fn publish(&mut self, logical_id: &str, leaf: &str, value: serde_json::Value) {
        self.nodes.push(ResourceNode::PublishedParameter(PublishedParameter {
            logical_id: logical_id.to_string(),
            parameter_name: self.props.parameter_name(leaf),
            value,
            removal_policy: self.props.removal_policy,
        }));
    }
}
