//! The `load_s3` task graph: GenerateArtifact feeding PersistArtifact.
//!
//! Runs move `Pending -> DataGenerated -> Uploaded`, or to `Failed` on the
//! first error. Errors are logged where they happen and returned unchanged;
//! nothing is retried and a failed upload always fails the run.

use std::time::Instant;

use chrono::Utc;
use s3_sample_core::contract::{
    validate_pipeline_config, PipelineConfig, PipelineError, RunReport, RunState, UploadConfig,
    LOAD_S3_JOB, REPORT_SCHEMA_VERSION,
};
use s3_sample_core::dataset::{generate_artifact, TabularArtifact};
use s3_sample_core::export::to_csv_bytes;
use s3_sample_core::storage_keys::{artifact_object_key, new_run_id};

use crate::adapters::credentials::{CredentialSet, RoleAssumer};
use crate::adapters::object_store::ObjectStore;
use crate::handlers::credentials::resolve_object_store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedObject {
    pub object_key: String,
    pub bytes_written: usize,
}

/// Tracks the state of one run and logs every transition.
#[derive(Debug)]
struct RunProgress {
    run_id: String,
    state: RunState,
}

impl RunProgress {
    fn new(run_id: String) -> Self {
        Self {
            run_id,
            state: RunState::Pending,
        }
    }

    fn advance(&mut self, next: RunState) {
        tracing::debug!(
            component = "load_s3_job",
            event = "state_changed",
            run_id = %self.run_id,
            from = ?self.state,
            to = ?next,
        );
        self.state = next;
    }

    fn fail(&mut self, error: PipelineError, started_at: Instant) -> PipelineError {
        tracing::error!(
            component = "load_s3_job",
            event = "run_failed",
            run_id = %self.run_id,
            failed_in = ?self.state,
            error_kind = error.kind(),
            error = %error,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "load_s3 run failed"
        );
        self.advance(RunState::Failed);
        error
    }
}

/// Serializes the table and writes it with a single put. No retry.
pub fn persist_artifact(
    artifact: &TabularArtifact,
    upload: &UploadConfig,
    run_id: &str,
    store: &impl ObjectStore,
) -> Result<PersistedObject, PipelineError> {
    let body = to_csv_bytes(artifact).map_err(|error| {
        let error = PipelineError::Storage(format!("failed to serialize artifact to csv: {error}"));
        tracing::error!(component = "persist_artifact", event = "serialize_failed", error = %error);
        error
    })?;

    let object_key = artifact_object_key(upload.key_prefix.as_deref(), run_id);
    tracing::info!(
        component = "persist_artifact",
        event = "upload_started",
        bucket = %upload.bucket_name,
        object_key = %object_key,
        bytes = body.len(),
        "uploading artifact"
    );

    if let Err(error) = store.put_object(&upload.bucket_name, &object_key, &body) {
        tracing::error!(
            component = "persist_artifact",
            event = "upload_failed",
            bucket = %upload.bucket_name,
            object_key = %object_key,
            error = %error,
        );
        return Err(PipelineError::Storage(error));
    }

    Ok(PersistedObject {
        object_key,
        bytes_written: body.len(),
    })
}

/// Runs the whole graph under a fresh run id taken from the wall clock.
pub fn run_load_s3<A, S, F>(
    config: &PipelineConfig,
    assumer: &A,
    build_store: F,
) -> Result<RunReport, PipelineError>
where
    A: RoleAssumer + ?Sized,
    S: ObjectStore,
    F: FnOnce(Option<CredentialSet>) -> S,
{
    run_load_s3_as(config, assumer, build_store, new_run_id(Utc::now()))
}

/// Runs the whole graph under `run_id`, which also names the uploaded object.
pub fn run_load_s3_as<A, S, F>(
    config: &PipelineConfig,
    assumer: &A,
    build_store: F,
    run_id: String,
) -> Result<RunReport, PipelineError>
where
    A: RoleAssumer + ?Sized,
    S: ObjectStore,
    F: FnOnce(Option<CredentialSet>) -> S,
{
    let timer = Instant::now();
    let mut progress = RunProgress::new(run_id);
    tracing::info!(
        component = "load_s3_job",
        event = "run_started",
        job = LOAD_S3_JOB.name,
        schedule = LOAD_S3_JOB.schedule.name,
        run_id = %progress.run_id,
        bucket = %config.upload.bucket_name,
        role_configured = config.role_arn.is_some(),
    );

    if let Err(error) = validate_pipeline_config(config) {
        return Err(progress.fail(error, timer));
    }

    let artifact = match generate_artifact(&config.generate) {
        Ok(artifact) => artifact,
        Err(error) => return Err(progress.fail(error, timer)),
    };
    progress.advance(RunState::DataGenerated);
    tracing::info!(
        component = "load_s3_job",
        event = "data_generated",
        run_id = %progress.run_id,
        rows = artifact.n_rows(),
        columns = artifact.n_cols(),
    );

    let resolved = match resolve_object_store(config.role_arn.as_deref(), assumer, build_store) {
        Ok(resolved) => resolved,
        Err(error) => return Err(progress.fail(error, timer)),
    };

    let persisted = match persist_artifact(
        &artifact,
        &config.upload,
        &progress.run_id,
        &resolved.store,
    ) {
        Ok(persisted) => persisted,
        Err(error) => return Err(progress.fail(error, timer)),
    };
    progress.advance(RunState::Uploaded);

    tracing::info!(
        component = "load_s3_job",
        event = "run_completed",
        run_id = %progress.run_id,
        object_key = %persisted.object_key,
        bytes_written = persisted.bytes_written,
        duration_ms = timer.elapsed().as_millis() as u64,
    );

    Ok(RunReport {
        run_id: progress.run_id,
        state: progress.state,
        bucket: config.upload.bucket_name.clone(),
        object_key: persisted.object_key,
        rows: artifact.n_rows(),
        columns: artifact.n_cols(),
        bytes_written: persisted.bytes_written,
        role_assumed: resolved.role_assumed,
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
    })
}
