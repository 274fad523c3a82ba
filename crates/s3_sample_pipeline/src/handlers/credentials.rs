use s3_sample_core::contract::{PipelineError, ROLE_SESSION_NAME};

use crate::adapters::credentials::{CredentialSet, RoleAssumer};
use crate::adapters::object_store::ObjectStore;

#[derive(Debug)]
pub struct ResolvedStore<S> {
    pub store: S,
    pub role_assumed: bool,
}

/// Produces the storage client for one run.
///
/// With a role configured, performs exactly one assumption and hands the
/// temporary credentials to `build_store`; otherwise `build_store` receives
/// `None` and uses the ambient identity. Credentials are never cached.
pub fn resolve_object_store<A, S, F>(
    role_arn: Option<&str>,
    assumer: &A,
    build_store: F,
) -> Result<ResolvedStore<S>, PipelineError>
where
    A: RoleAssumer + ?Sized,
    S: ObjectStore,
    F: FnOnce(Option<CredentialSet>) -> S,
{
    let Some(role_arn) = role_arn else {
        tracing::info!(
            component = "credentials",
            event = "ambient_identity",
            "no role configured, using ambient credentials"
        );
        return Ok(ResolvedStore {
            store: build_store(None),
            role_assumed: false,
        });
    };

    if role_arn.trim().is_empty() {
        return Err(PipelineError::configuration("role_arn cannot be empty"));
    }

    match assumer.assume_role(role_arn, ROLE_SESSION_NAME) {
        Ok(credentials) => {
            tracing::info!(
                component = "credentials",
                event = "role_assumed",
                role_arn,
                session_name = ROLE_SESSION_NAME,
                expiration = credentials.expiration.as_deref().unwrap_or("unknown"),
                "assumed role for storage access"
            );
            Ok(ResolvedStore {
                store: build_store(Some(credentials)),
                role_assumed: true,
            })
        }
        Err(error) => {
            tracing::error!(
                component = "credentials",
                event = "role_assumption_failed",
                role_arn,
                error = %error,
                "role assumption failed"
            );
            Err(PipelineError::Credential(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug)]
    struct NullStore;

    impl ObjectStore for NullStore {
        fn put_object(&self, _bucket: &str, _key: &str, _body: &[u8]) -> Result<(), String> {
            Ok(())
        }
    }

    struct CapturingAssumer {
        calls: Mutex<Vec<(String, String)>>,
        outcome: Result<CredentialSet, String>,
    }

    impl CapturingAssumer {
        fn new(outcome: Result<CredentialSet, String>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("poisoned mutex").clone()
        }
    }

    impl RoleAssumer for CapturingAssumer {
        fn assume_role(
            &self,
            role_arn: &str,
            session_name: &str,
        ) -> Result<CredentialSet, String> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push((role_arn.to_string(), session_name.to_string()));
            self.outcome.clone()
        }
    }

    fn temporary_credentials() -> CredentialSet {
        CredentialSet {
            access_key_id: "ASIATEMP".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiration: Some("2026-02-14T01:00:00Z".to_string()),
        }
    }

    #[test]
    fn skips_assumption_without_role() {
        let assumer = CapturingAssumer::new(Ok(temporary_credentials()));
        let mut received = Some(temporary_credentials());

        let resolved = resolve_object_store(None, &assumer, |credentials| {
            received = credentials;
            NullStore
        })
        .expect("ambient store should resolve");

        assert!(!resolved.role_assumed);
        assert!(received.is_none());
        assert!(assumer.calls().is_empty());
    }

    #[test]
    fn binds_store_to_assumed_credentials() {
        let assumer = CapturingAssumer::new(Ok(temporary_credentials()));
        let mut received = None;

        let resolved = resolve_object_store(
            Some("arn:aws:iam::123456789012:role/pipeline"),
            &assumer,
            |credentials| {
                received = credentials;
                NullStore
            },
        )
        .expect("role store should resolve");

        assert!(resolved.role_assumed);
        assert_eq!(received, Some(temporary_credentials()));
        assert_eq!(
            assumer.calls(),
            vec![(
                "arn:aws:iam::123456789012:role/pipeline".to_string(),
                ROLE_SESSION_NAME.to_string()
            )]
        );
    }

    #[test]
    fn provider_error_is_returned_unchanged() {
        let assumer = CapturingAssumer::new(Err("AccessDenied: not authorized".to_string()));
        let mut built = false;

        let error = resolve_object_store(Some("arn:aws:iam::1:role/x"), &assumer, |_| {
            built = true;
            NullStore
        })
        .expect_err("assumption failure should propagate");

        assert_eq!(
            error,
            PipelineError::Credential("AccessDenied: not authorized".to_string())
        );
        assert!(!built);
        assert_eq!(assumer.calls().len(), 1);
    }

    #[test]
    fn blank_role_is_a_configuration_error() {
        let assumer = CapturingAssumer::new(Ok(temporary_credentials()));
        let error = resolve_object_store(Some("  "), &assumer, |_| NullStore)
            .expect_err("blank role should fail");
        assert!(matches!(error, PipelineError::Configuration(_)));
        assert!(assumer.calls().is_empty());
    }
}
