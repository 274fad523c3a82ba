use lambda_runtime::{service_fn, Error, LambdaEvent};
use s3_sample_core::contract::{
    optional_env, required_env, GenerateOverrides, PipelineConfig, RunReport, UploadConfig,
    ENV_BUCKET, ENV_KEY_PREFIX, ENV_ROLE_ARN, LOAD_S3_JOB,
};
use s3_sample_pipeline::adapters::aws::{load_sdk_config, S3ObjectStore, StsRoleAssumer};
use s3_sample_pipeline::handlers::job::run_load_s3;
use s3_sample_pipeline::logging::init_logging;
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<RunReport, Error> {
    let overrides = decode_overrides(&event.payload)?;
    let config = PipelineConfig {
        generate: overrides.apply_to(&LOAD_S3_JOB.default_generate_config()),
        upload: UploadConfig {
            bucket_name: required_setting(ENV_BUCKET)?,
            key_prefix: optional_env(ENV_KEY_PREFIX),
        },
        role_arn: optional_env(ENV_ROLE_ARN),
    };

    let sdk_config = load_sdk_config().await;
    let assumer = StsRoleAssumer::from_sdk_config(&sdk_config);

    run_load_s3(&config, &assumer, |credentials| {
        S3ObjectStore::from_sdk_config(&sdk_config, credentials)
    })
    .map_err(|error| Error::from(error.to_string()))
}

/// Logs a configuration failure where it is detected and turns it into the invocation error.
fn configuration_failed(message: String) -> Error {
    tracing::error!(
        component = "load_s3_lambda",
        event = "configuration_failed",
        error = %message,
    );
    Error::from(message)
}

fn required_setting(name: &str) -> Result<String, Error> {
    required_env(name).map_err(|error| configuration_failed(error.to_string()))
}

/// Generation overrides from a direct invocation payload or from the `detail`
/// of a scheduled EventBridge event. Anything else runs with job defaults.
fn decode_overrides(payload: &Value) -> Result<GenerateOverrides, Error> {
    let source = if is_scheduled_event(payload) {
        payload.get("detail").unwrap_or(&Value::Null)
    } else {
        payload
    };

    match source {
        Value::Null => Ok(GenerateOverrides::default()),
        Value::Object(map) if map.is_empty() => Ok(GenerateOverrides::default()),
        Value::Object(_) => serde_json::from_value(source.clone())
            .map_err(|error| configuration_failed(format!("invalid load_s3 payload: {error}"))),
        _ => Err(configuration_failed("load_s3 payload must be a JSON object".to_string())),
    }
}

fn is_scheduled_event(payload: &Value) -> bool {
    payload.get("source").and_then(Value::as_str) == Some("aws.events")
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
