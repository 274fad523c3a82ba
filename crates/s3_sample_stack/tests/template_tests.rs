use serde_json::{json, Value};

use s3_sample_stack::resources::{
    BUCKET_READ_WRITE_ACTIONS, IAM_POLICY_TYPE, IAM_ROLE_TYPE, KMS_ALIAS_TYPE, KMS_KEY_TYPE,
    S3_BUCKET_POLICY_TYPE, S3_BUCKET_TYPE, SSM_PARAMETER_TYPE,
};
use s3_sample_stack::stack::default_tags;
use s3_sample_stack::{SampleStack, StackProps, TagContext, Template};

fn sample_template() -> Template {
    SampleStack::synth(StackProps {
        account: Some("12345678901".to_string()),
        region: Some("eu-central-1".to_string()),
        ..StackProps::default()
    })
}

fn single<'a>(template: &'a Template, type_name: &'a str) -> &'a Value {
    let resources = template.resources_of_type(type_name);
    assert_eq!(resources.len(), 1, "expected exactly one {type_name}");
    resources[0].1
}

#[test]
fn declares_one_key_one_bucket_one_role() {
    let template = sample_template();
    assert_eq!(template.resource_count(KMS_KEY_TYPE), 1);
    assert_eq!(template.resource_count(S3_BUCKET_TYPE), 1);
    assert_eq!(template.resource_count(IAM_ROLE_TYPE), 1);
    assert_eq!(template.resource_count(SSM_PARAMETER_TYPE), 2);
}

#[test]
fn bucket_blocks_all_public_access_and_is_versioned() {
    let template = sample_template();
    let bucket = single(&template, S3_BUCKET_TYPE);
    let properties = &bucket["Properties"];

    assert_eq!(
        properties["PublicAccessBlockConfiguration"],
        json!({
            "BlockPublicAcls": true,
            "BlockPublicPolicy": true,
            "IgnorePublicAcls": true,
            "RestrictPublicBuckets": true,
        })
    );
    assert_eq!(properties["VersioningConfiguration"]["Status"], "Enabled");
}

#[test]
fn bucket_is_encrypted_with_the_stack_key() {
    let template = sample_template();
    let bucket = single(&template, S3_BUCKET_TYPE);
    let default_encryption =
        &bucket["Properties"]["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
            ["ServerSideEncryptionByDefault"];

    assert_eq!(default_encryption["SSEAlgorithm"], "aws:kms");
    assert_eq!(
        default_encryption["KMSMasterKeyID"],
        json!({ "Fn::GetAtt": ["DataBucketKey", "Arn"] })
    );
}

#[test]
fn bucket_requires_encrypted_transport() {
    let template = sample_template();
    let policy = single(&template, S3_BUCKET_POLICY_TYPE);
    let statement = &policy["Properties"]["PolicyDocument"]["Statement"][0];

    assert_eq!(policy["Properties"]["Bucket"], json!({ "Ref": "DataBucket" }));
    assert_eq!(statement["Effect"], "Deny");
    assert_eq!(statement["Action"], "s3:*");
    assert_eq!(
        statement["Condition"]["Bool"]["aws:SecureTransport"],
        "false"
    );
}

#[test]
fn key_rotates_and_has_alias() {
    let template = sample_template();
    let key = single(&template, KMS_KEY_TYPE);
    assert_eq!(key["Properties"]["EnableKeyRotation"], true);
    assert_eq!(key["Properties"]["Enabled"], true);

    let alias = single(&template, KMS_ALIAS_TYPE);
    assert_eq!(alias["Properties"]["AliasName"], "alias/Keys/S3Sample");
}

#[test]
fn role_grants_bucket_read_write_and_key_encrypt_decrypt() {
    let template = sample_template();
    let policy = single(&template, IAM_POLICY_TYPE);
    let statements = policy["Properties"]["PolicyDocument"]["Statement"]
        .as_array()
        .expect("policy statements should be an array");

    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0]["Action"].as_array().map(Vec::len),
        Some(BUCKET_READ_WRITE_ACTIONS.len())
    );
    assert!(statements[1]["Action"]
        .as_array()
        .expect("key actions")
        .contains(&json!("kms:Decrypt")));
    assert_eq!(
        policy["Properties"]["Roles"],
        json!([{ "Ref": "CodeLocationRole" }])
    );

    let role = single(&template, IAM_ROLE_TYPE);
    let trust = &role["Properties"]["AssumeRolePolicyDocument"]["Statement"][0];
    assert_eq!(trust["Action"], "sts:AssumeRole");
    assert_eq!(trust["Principal"]["AWS"]["Fn::Join"][1][4], ":root");
}

#[test]
fn publishes_bucket_name_and_role_arn_parameters() {
    let template = sample_template();
    let mut published: Vec<(String, Value)> = template
        .resources_of_type(SSM_PARAMETER_TYPE)
        .into_iter()
        .map(|(_, parameter)| {
            (
                parameter["Properties"]["Name"]
                    .as_str()
                    .expect("parameter name")
                    .to_string(),
                parameter["Properties"]["Value"].clone(),
            )
        })
        .collect();
    published.sort_by(|left, right| left.0.cmp(&right.0));

    assert_eq!(
        published,
        vec![
            (
                "/s3-sample/BucketName".to_string(),
                json!({ "Ref": "DataBucket" })
            ),
            (
                "/s3-sample/RoleArn".to_string(),
                json!({ "Fn::GetAtt": ["CodeLocationRole", "Arn"] })
            ),
        ]
    );
    assert_eq!(template.output_ids().len(), 2);
}

#[test]
fn every_resource_is_destroyed_on_teardown() {
    let template = sample_template();
    let resources = template.as_value()["Resources"]
        .as_object()
        .expect("resources object");
    assert!(!resources.is_empty());
    for (logical_id, resource) in resources {
        assert_eq!(
            resource["DeletionPolicy"], "Delete",
            "{logical_id} should be deleted with the stack"
        );
    }
}

#[test]
fn custom_prefix_and_environment_are_rendered() {
    let template = SampleStack::synth(StackProps {
        parameter_prefix: "/dagster/s3-sample".to_string(),
        account: Some("12345678901".to_string()),
        ..StackProps::default()
    });

    assert_eq!(template.as_value()["Metadata"]["Account"], "12345678901");
    assert!(template.as_value()["Metadata"].get("Region").is_none());
    assert!(template
        .resources_of_type(SSM_PARAMETER_TYPE)
        .iter()
        .any(|(_, parameter)| parameter["Properties"]["Name"] == "/dagster/s3-sample/RoleArn"));
}

#[test]
fn taggable_resources_carry_stack_tags() {
    let template = SampleStack::synth(StackProps {
        tags: default_tags(&TagContext {
            repository: Some("s3-sample".to_string()),
            team: Some("data-platform".to_string()),
            branch: Some("main".to_string()),
            owner: Some("063209".to_string()),
            ..TagContext::default()
        }),
        ..StackProps::default()
    });

    let bucket_tags = single(&template, S3_BUCKET_TYPE)["Properties"]["Tags"]
        .as_array()
        .expect("bucket tags");
    for (key, value) in [
        ("Name", "s3-sample"),
        ("NameRepository", "s3-sample"),
        ("RepositoryLocation", "GitLab"),
        ("NameTeam", "data-platform"),
        ("Expiry", "never"),
        ("DeploymentBranch", "main"),
        ("StackOwnerPersonalID", "063209"),
    ] {
        assert!(
            bucket_tags.contains(&json!({ "Key": key, "Value": value })),
            "bucket is missing tag {key}"
        );
    }

    let parameter = template.resources_of_type(SSM_PARAMETER_TYPE)[0].1;
    assert_eq!(parameter["Properties"]["Tags"]["NameTeam"], "data-platform");
    assert_eq!(parameter["Properties"]["Tags"]["StackOwnerPersonalID"], "063209");
}

#[test]
fn template_serializes_to_json() {
    let rendered = sample_template().to_json_pretty().expect("template should serialize");
    let reparsed: Value = serde_json::from_str(&rendered).expect("template should reparse");
    assert_eq!(reparsed["AWSTemplateFormatVersion"], "2010-09-09");
}
