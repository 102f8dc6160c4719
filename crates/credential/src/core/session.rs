use crate::core::Identity;
use crate::utils::SecretString;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Short-lived credentials issued by the token-exchange service
///
/// Owned by the [`CredentialCache`](crate::cache::CredentialCache) and
/// replaced wholesale on renewal.
#[derive(Clone, PartialEq, Eq)]
pub struct DelegatedSession {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: SecretString,
    expires_at: SystemTime,
}

impl DelegatedSession {
    /// Build a session from the exchange response
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expires_at: SystemTime,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret_access_key.into()),
            session_token: SecretString::new(session_token.into()),
            expires_at,
        }
    }

    /// Access key id of the session
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Absolute hard expiry reported by the exchange service
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Point from which the session must be renewed: `expires_at - skew`
    ///
    /// Never earlier than the Unix epoch.
    pub fn renew_at(&self, skew: Duration) -> SystemTime {
        self.expires_at
            .checked_sub(skew)
            .map_or(UNIX_EPOCH, |at| at.max(UNIX_EPOCH))
    }

    /// `now < expires_at - skew`
    pub fn is_fresh(&self, now: SystemTime, skew: Duration) -> bool {
        now < self.renew_at(skew)
    }

    /// `now >= expires_at`
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    /// Credentials a caller can sign requests with
    pub fn to_identity(&self) -> Identity {
        Identity::new(
            self.access_key_id.clone(),
            self.secret_access_key.expose_secret(str::to_owned),
            Some(self.session_token.expose_secret(str::to_owned)),
        )
    }
}

impl fmt::Debug for DelegatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedSession")
            .field("access_key_id", &self.access_key_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_at(secs: u64) -> DelegatedSession {
        DelegatedSession::new(
            "ASIAEXAMPLE",
            "secret",
            "token",
            UNIX_EPOCH + Duration::from_secs(secs),
        )
    }

    #[test]
    fn test_freshness_boundaries_with_sixty_second_skew() {
        let t0 = 10_000;
        let session = session_expiring_at(t0);
        let skew = Duration::from_secs(60);
        let at = |secs: u64| UNIX_EPOCH + Duration::from_secs(secs);

        assert!(session.is_fresh(at(t0 - 61), skew));
        assert!(!session.is_fresh(at(t0 - 60), skew));
        assert!(!session.is_fresh(at(t0 - 59), skew));
    }

    #[test]
    fn test_hard_expiry() {
        let session = session_expiring_at(10_000);
        assert!(!session.is_expired(UNIX_EPOCH + Duration::from_secs(9_999)));
        assert!(session.is_expired(UNIX_EPOCH + Duration::from_secs(10_000)));
    }

    #[test]
    fn test_skew_larger_than_expiry_is_never_fresh() {
        let session = session_expiring_at(30);
        assert_eq!(session.renew_at(Duration::from_secs(60)), UNIX_EPOCH);
        assert!(!session.is_fresh(UNIX_EPOCH, Duration::from_secs(60)));
    }

    #[test]
    fn test_to_identity_copies_all_fields() {
        let identity = session_expiring_at(10_000).to_identity();
        assert!(identity.is_complete());
        assert_eq!(identity.access_key_id(), "ASIAEXAMPLE");
        identity
            .session_token()
            .expect("token")
            .expose_secret(|t| assert_eq!(t, "token"));
    }
}
