use serde::{Deserialize, Serialize};

pub const REPORT_SCHEMA_VERSION: &str = "v1";
pub const ROLE_SESSION_NAME: &str = "s3-sample-pipeline";

pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_KEY_PREFIX: &str = "S3_KEY_PREFIX";
pub const ENV_ROLE_ARN: &str = "IAM_ROLE_ARN";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Bounds and shape of the generated table.
///
/// Field names on the wire follow the job's run config
/// (`random_min_size`, `random_max_size`, `n_rows`, `n_cols`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateConfig {
    #[serde(rename = "random_min_size")]
    pub min_value: i64,
    #[serde(rename = "random_max_size")]
    pub max_value: i64,
    pub n_rows: usize,
    pub n_cols: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Partial generation config, as accepted from an invocation payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateOverrides {
    #[serde(default, rename = "random_min_size")]
    pub min_value: Option<i64>,
    #[serde(default, rename = "random_max_size")]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub n_rows: Option<usize>,
    #[serde(default)]
    pub n_cols: Option<usize>,
    #[serde(default)]
    pub column_names: Option<Vec<String>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerateOverrides {
    pub fn apply_to(self, base: &GenerateConfig) -> GenerateConfig {
        GenerateConfig {
            min_value: self.min_value.unwrap_or(base.min_value),
            max_value: self.max_value.unwrap_or(base.max_value),
            n_rows: self.n_rows.unwrap_or(base.n_rows),
            n_cols: self.n_cols.unwrap_or(base.n_cols),
            column_names: self.column_names.or_else(|| base.column_names.clone()),
            seed: self.seed.or(base.seed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadConfig {
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub generate: GenerateConfig,
    pub upload: UploadConfig,
    pub role_arn: Option<String>,
}

/// Failure taxonomy for a pipeline run.
///
/// Credential and storage messages carry the provider's error text unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("credential error: {0}")]
    Credential(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl PipelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Credential(_) => "credential_error",
            Self::Storage(_) => "storage_error",
        }
    }
}

pub fn validate_generate_config(config: &GenerateConfig) -> Result<(), PipelineError> {
    if config.min_value >= config.max_value {
        return Err(PipelineError::configuration(format!(
            "random_min_size ({}) must be less than random_max_size ({})",
            config.min_value, config.max_value
        )));
    }

    if let Some(names) = &config.column_names {
        if names.len() != config.n_cols {
            return Err(PipelineError::configuration(format!(
                "column_names has {} entries but n_cols is {}",
                names.len(),
                config.n_cols
            )));
        }
    }

    Ok(())
}

pub fn validate_upload_config(config: &UploadConfig) -> Result<(), PipelineError> {
    if config.bucket_name.trim().is_empty() {
        return Err(PipelineError::configuration("bucket_name cannot be empty"));
    }
    Ok(())
}

pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), PipelineError> {
    validate_generate_config(&config.generate)?;
    validate_upload_config(&config.upload)?;
    if let Some(role_arn) = &config.role_arn {
        if role_arn.trim().is_empty() {
            return Err(PipelineError::configuration("role_arn cannot be empty"));
        }
    }
    Ok(())
}

/// Looks up a required environment variable, treating empty values as missing.
pub fn required_env(name: &str) -> Result<String, PipelineError> {
    optional_env(name)
        .ok_or_else(|| PipelineError::configuration(format!("{name} must be configured")))
}

pub fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    DataGenerated,
    Uploaded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub state: RunState,
    pub bucket: String,
    pub object_key: String,
    pub rows: usize,
    pub columns: usize,
    pub bytes_written: usize,
    pub role_assumed: bool,
    pub schema_version: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduleDefinition {
    pub name: &'static str,
    pub expression: &'static str,
    pub enabled_by_default: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub schedule: ScheduleDefinition,
}

pub const LOAD_S3_JOB: JobDefinition = JobDefinition {
    name: "load_s3",
    description: "Creates a random integer table and uploads it as CSV to the data bucket.",
    schedule: ScheduleDefinition {
        name: "daily_load_s3",
        expression: "cron(0 0 * * ? *)",
        enabled_by_default: true,
    },
};

impl JobDefinition {
    pub fn default_generate_config(&self) -> GenerateConfig {
        GenerateConfig {
            min_value: 0,
            max_value: 100,
            n_rows: 0,
            n_cols: 4,
            column_names: None,
            seed: None,
        }
    }

    /// The job as handed to an external scheduler: identity, schedule and default run config.
    pub fn manifest(&self) -> JobManifest {
        JobManifest {
            job: self.clone(),
            default_run_config: self.default_generate_config(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobManifest {
    #[serde(flatten)]
    pub job: JobDefinition,
    pub default_run_config: GenerateConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n_cols: usize, names: Option<Vec<&str>>) -> GenerateConfig {
        GenerateConfig {
            min_value: 0,
            max_value: 100,
            n_rows: 10,
            n_cols,
            column_names: names.map(|names| names.into_iter().map(str::to_string).collect()),
            seed: None,
        }
    }

    #[test]
    fn accepts_matching_column_names() {
        assert!(validate_generate_config(&config(2, Some(vec!["a", "b"]))).is_ok());
        assert!(validate_generate_config(&config(4, None)).is_ok());
    }

    #[test]
    fn rejects_column_name_count_mismatch() {
        let error = validate_generate_config(&config(3, Some(vec!["a", "b"])))
            .expect_err("mismatch should fail");
        assert_eq!(error.kind(), "configuration_error");
        assert!(error.to_string().contains("column_names has 2 entries but n_cols is 3"));
    }

    #[test]
    fn rejects_empty_value_range() {
        let mut invalid = config(4, None);
        invalid.min_value = 100;
        let error = validate_generate_config(&invalid).expect_err("empty range should fail");
        assert!(error.to_string().contains("must be less than"));
    }

    #[test]
    fn accepts_zero_columns_and_repeated_labels() {
        assert!(validate_generate_config(&config(0, None)).is_ok());
        assert!(validate_generate_config(&config(0, Some(vec![]))).is_ok());
        assert!(validate_generate_config(&config(2, Some(vec!["a", "a"]))).is_ok());
    }

    #[test]
    fn rejects_blank_bucket() {
        let error = validate_upload_config(&UploadConfig {
            bucket_name: "  ".to_string(),
            key_prefix: None,
        })
        .expect_err("blank bucket should fail");
        assert!(matches!(error, PipelineError::Configuration(_)));
    }

    #[test]
    fn overrides_fall_back_to_job_defaults() {
        let overrides: GenerateOverrides =
            serde_json::from_str(r#"{"n_rows": 25, "column_names": ["A","B","C","D"]}"#)
                .expect("overrides should parse");
        let merged = overrides.apply_to(&LOAD_S3_JOB.default_generate_config());

        assert_eq!(merged.min_value, 0);
        assert_eq!(merged.max_value, 100);
        assert_eq!(merged.n_rows, 25);
        assert_eq!(merged.n_cols, 4);
        assert_eq!(merged.column_names.map(|names| names.len()), Some(4));
    }

    #[test]
    fn generate_config_uses_run_config_field_names() {
        let parsed: GenerateConfig = serde_json::from_str(
            r#"{"random_min_size": 5, "random_max_size": 9, "n_rows": 1, "n_cols": 2}"#,
        )
        .expect("config should parse");
        assert_eq!(parsed.min_value, 5);
        assert_eq!(parsed.max_value, 9);
        assert_eq!(parsed.column_names, None);
    }

    #[test]
    fn manifest_publishes_daily_schedule_and_defaults() {
        let manifest = serde_json::to_value(LOAD_S3_JOB.manifest()).expect("manifest serializes");

        assert_eq!(manifest["name"], "load_s3");
        assert_eq!(manifest["schedule"]["name"], "daily_load_s3");
        assert_eq!(manifest["schedule"]["expression"], "cron(0 0 * * ? *)");
        assert_eq!(manifest["schedule"]["enabled_by_default"], true);
        assert_eq!(manifest["default_run_config"]["random_min_size"], 0);
        assert_eq!(manifest["default_run_config"]["random_max_size"], 100);
        assert_eq!(manifest["default_run_config"]["n_cols"], 4);
    }
}
