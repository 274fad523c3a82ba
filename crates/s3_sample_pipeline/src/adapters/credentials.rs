use std::fmt;

/// Short-lived credentials returned by a role assumption.
///
/// Used once to bind a storage client and then dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<String>,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

pub trait RoleAssumer {
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<CredentialSet, String>;
}

impl<T: RoleAssumer + ?Sized> RoleAssumer for &T {
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<CredentialSet, String> {
        (**self).assume_role(role_arn, session_name)
    }
}
