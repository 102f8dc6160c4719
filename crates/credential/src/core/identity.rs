use crate::utils::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential material: an access key pair plus an optional session token
///
/// Used both for the long-lived identity a provider is configured with and
/// for the credentials it hands back to callers. Immutable once built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    access_key_id: String,
    secret_access_key: SecretString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_token: Option<SecretString>,
}

impl Identity {
    /// Build an identity from its parts
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret_access_key.into()),
            session_token: session_token.map(SecretString::new),
        }
    }

    /// Access key id (not secret)
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Secret access key
    pub fn secret_access_key(&self) -> &SecretString {
        &self.secret_access_key
    }

    /// Session token, if this is session credential material
    pub fn session_token(&self) -> Option<&SecretString> {
        self.session_token.as_ref()
    }

    /// All three fields are present and non-empty
    ///
    /// Only a complete identity is eligible for the explicit or delegated
    /// resolution paths.
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && self.session_token.as_ref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("access_key_id", &self.access_key_id)
            .field("has_session_token", &self.session_token.is_some())
            .finish()
    }
}
