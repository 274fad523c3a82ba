#![allow(dead_code)]

use std::sync::Mutex;

use s3_sample_pipeline::adapters::credentials::{CredentialSet, RoleAssumer};
use s3_sample_pipeline::adapters::object_store::ObjectStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRecord {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

/// In-memory bucket that records every put, optionally failing each one.
#[derive(Default)]
pub struct RecordingStore {
    puts: Mutex<Vec<PutRecord>>,
    failure: Option<String>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().expect("poisoned mutex").clone()
    }
}

impl ObjectStore for RecordingStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        self.puts.lock().expect("poisoned mutex").push(PutRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: body.to_vec(),
        });
        match &self.failure {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

/// Role assumer returning a fixed outcome and recording each call.
pub struct StubAssumer {
    calls: Mutex<Vec<(String, String)>>,
    outcome: Result<CredentialSet, String>,
}

impl StubAssumer {
    pub fn granting() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Ok(temporary_credentials()),
        }
    }

    pub fn denying(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Err(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl RoleAssumer for StubAssumer {
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<CredentialSet, String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((role_arn.to_string(), session_name.to_string()));
        self.outcome.clone()
    }
}

pub fn temporary_credentials() -> CredentialSet {
    CredentialSet {
        access_key_id: "ASIATESTKEY".to_string(),
        secret_access_key: "test-secret".to_string(),
        session_token: "test-session-token".to_string(),
        expiration: Some("2026-10-18T01:00:00Z".to_string()),
    }
}
