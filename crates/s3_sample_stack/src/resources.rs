use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const KMS_KEY_TYPE: &str = "AWS::KMS::Key";
pub const KMS_ALIAS_TYPE: &str = "AWS::KMS::Alias";
pub const S3_BUCKET_TYPE: &str = "AWS::S3::Bucket";
pub const S3_BUCKET_POLICY_TYPE: &str = "AWS::S3::BucketPolicy";
pub const IAM_ROLE_TYPE: &str = "AWS::IAM::Role";
pub const IAM_POLICY_TYPE: &str = "AWS::IAM::Policy";
pub const SSM_PARAMETER_TYPE: &str = "AWS::SSM::Parameter";

const POLICY_VERSION: &str = "2012-10-17";

pub const BUCKET_READ_WRITE_ACTIONS: &[&str] = &[
    "s3:GetObject*",
    "s3:GetBucket*",
    "s3:List*",
    "s3:DeleteObject*",
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

pub const KEY_ENCRYPT_DECRYPT_ACTIONS: &[&str] = &[
    "kms:Decrypt",
    "kms:DescribeKey",
    "kms:Encrypt",
    "kms:ReEncrypt*",
    "kms:GenerateDataKey*",
];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    #[default]
    Destroy,
    Retain,
}

impl RemovalPolicy {
    fn as_cfn(self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHandle {
    logical_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
    logical_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    logical_id: String,
}

impl KeyHandle {
    pub(crate) fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }
}

impl BucketHandle {
    pub(crate) fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn bucket_name(&self) -> Value {
        reference(&self.logical_id)
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }

    pub fn objects_arn(&self) -> Value {
        json!({ "Fn::Join": ["", [self.arn(), "/*"]] })
    }
}

impl RoleHandle {
    pub(crate) fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPublicAccess {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl BlockPublicAccess {
    pub const BLOCK_ALL: Self = Self {
        block_public_acls: true,
        block_public_policy: true,
        ignore_public_acls: true,
        restrict_public_buckets: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    BucketReadWrite(BucketHandle),
    KeyEncryptDecrypt(KeyHandle),
}

impl Grant {
    fn statement(&self) -> Value {
        match self {
            Self::BucketReadWrite(bucket) => json!({
                "Effect": "Allow",
                "Action": BUCKET_READ_WRITE_ACTIONS,
                "Resource": [bucket.arn(), bucket.objects_arn()],
            }),
            Self::KeyEncryptDecrypt(key) => json!({
                "Effect": "Allow",
                "Action": KEY_ENCRYPT_DECRYPT_ACTIONS,
                "Resource": key.arn(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    pub handle: KeyHandle,
    pub alias: String,
    pub enabled: bool,
    pub enable_key_rotation: bool,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBucket {
    pub handle: BucketHandle,
    pub encryption_key: KeyHandle,
    pub versioned: bool,
    pub enforce_ssl: bool,
    pub block_public_access: BlockPublicAccess,
    pub removal_policy: RemovalPolicy,
}

/// Role assumable by the account root principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRole {
    pub handle: RoleHandle,
    pub grants: Vec<Grant>,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedParameter {
    pub logical_id: String,
    pub parameter_name: String,
    pub value: Value,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNode {
    EncryptionKey(EncryptionKey),
    ObjectBucket(ObjectBucket),
    AccessRole(AccessRole),
    PublishedParameter(PublishedParameter),
}

impl ResourceNode {
    /// Renders the node into one or more CloudFormation resources keyed by logical id.
    pub(crate) fn render(&self, tags: &BTreeMap<String, String>) -> Vec<(String, Value)> {
        match self {
            Self::EncryptionKey(key) => render_key(key, tags),
            Self::ObjectBucket(bucket) => render_bucket(bucket, tags),
            Self::AccessRole(role) => render_role(role, tags),
            Self::PublishedParameter(parameter) => render_parameter(parameter, tags),
        }
    }
}

fn render_key(key: &EncryptionKey, tags: &BTreeMap<String, String>) -> Vec<(String, Value)> {
    let id = key.handle.logical_id();
    let key_resource = resource(
        KMS_KEY_TYPE,
        json!({
            "Enabled": key.enabled,
            "EnableKeyRotation": key.enable_key_rotation,
            "KeyPolicy": {
                "Version": POLICY_VERSION,
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "AWS": account_root_arn() },
                    "Action": "kms:*",
                    "Resource": "*",
                }],
            },
            "Tags": tag_list(tags),
        }),
        key.removal_policy,
    );
    let alias_resource = resource(
        KMS_ALIAS_TYPE,
        json!({
            "AliasName": alias_name(&key.alias),
            "TargetKeyId": key.handle.arn(),
        }),
        key.removal_policy,
    );

    vec![
        (id.to_string(), key_resource),
        (format!("{id}Alias"), alias_resource),
    ]
}

fn render_bucket(bucket: &ObjectBucket, tags: &BTreeMap<String, String>) -> Vec<(String, Value)> {
    let id = bucket.handle.logical_id();
    let access = &bucket.block_public_access;
    let mut properties = json!({
        "BucketEncryption": {
            "ServerSideEncryptionConfiguration": [{
                "ServerSideEncryptionByDefault": {
                    "SSEAlgorithm": "aws:kms",
                    "KMSMasterKeyID": bucket.encryption_key.arn(),
                },
            }],
        },
        "PublicAccessBlockConfiguration": {
            "BlockPublicAcls": access.block_public_acls,
            "BlockPublicPolicy": access.block_public_policy,
            "IgnorePublicAcls": access.ignore_public_acls,
            "RestrictPublicBuckets": access.restrict_public_buckets,
        },
        "Tags": tag_list(tags),
    });
    if bucket.versioned {
        properties["VersioningConfiguration"] = json!({ "Status": "Enabled" });
    }

    let mut rendered = vec![(
        id.to_string(),
        resource(S3_BUCKET_TYPE, properties, bucket.removal_policy),
    )];

    if bucket.enforce_ssl {
        let policy = resource(
            S3_BUCKET_POLICY_TYPE,
            json!({
                "Bucket": bucket.handle.bucket_name(),
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Effect": "Deny",
                        "Principal": { "AWS": "*" },
                        "Action": "s3:*",
                        "Condition": { "Bool": { "aws:SecureTransport": "false" } },
                        "Resource": [bucket.handle.arn(), bucket.handle.objects_arn()],
                    }],
                },
            }),
            bucket.removal_policy,
        );
        rendered.push((format!("{id}Policy"), policy));
    }

    rendered
}

fn render_role(role: &AccessRole, tags: &BTreeMap<String, String>) -> Vec<(String, Value)> {
    let id = role.handle.logical_id();
    let role_resource = resource(
        IAM_ROLE_TYPE,
        json!({
            "AssumeRolePolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "AWS": account_root_arn() },
                    "Action": "sts:AssumeRole",
                }],
            },
            "Tags": tag_list(tags),
        }),
        role.removal_policy,
    );

    let mut rendered = vec![(id.to_string(), role_resource)];
    if !role.grants.is_empty() {
        let statements: Vec<Value> = role.grants.iter().map(Grant::statement).collect();
        let policy = resource(
            IAM_POLICY_TYPE,
            json!({
                "PolicyName": format!("{id}DefaultPolicy"),
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": statements,
                },
                "Roles": [reference(id)],
            }),
            role.removal_policy,
        );
        rendered.push((format!("{id}DefaultPolicy"), policy));
    }
    rendered
}

fn render_parameter(
    parameter: &PublishedParameter,
    tags: &BTreeMap<String, String>,
) -> Vec<(String, Value)> {
    let tag_map: Map<String, Value> = tags
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
        .collect();
    vec![(
        parameter.logical_id.clone(),
        resource(
            SSM_PARAMETER_TYPE,
            json!({
                "Type": "String",
                "Name": parameter.parameter_name,
                "Value": parameter.value,
                "Tags": tag_map,
            }),
            parameter.removal_policy,
        ),
    )]
}

fn resource(type_name: &str, properties: Value, removal_policy: RemovalPolicy) -> Value {
    json!({
        "Type": type_name,
        "Properties": properties,
        "DeletionPolicy": removal_policy.as_cfn(),
        "UpdateReplacePolicy": removal_policy.as_cfn(),
    })
}

fn tag_list(tags: &BTreeMap<String, String>) -> Value {
    Value::Array(
        tags.iter()
            .map(|(key, value)| json!({ "Key": key, "Value": value }))
            .collect(),
    )
}

fn alias_name(alias: &str) -> String {
    let trimmed = alias.trim_matches('/');
    if trimmed.starts_with("alias/") {
        trimmed.to_string()
    } else {
        format!("alias/{trimmed}")
    }
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

fn account_root_arn() -> Value {
    json!({
        "Fn::Join": ["", [
            "arn:",
            { "Ref": "AWS::Partition" },
            ":iam::",
            { "Ref": "AWS::AccountId" },
            ":root",
        ]]
    })
}
