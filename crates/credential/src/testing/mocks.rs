use crate::ambient::HostIdentityClient;
use crate::clock::Clock;
use crate::core::{AmbientError, DelegatedSession, ExchangeError, Identity};
use crate::delegation::DelegationClient;
use crate::testing::fixtures::host_identity;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// Arguments of one `assume_role` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExchange {
    /// Access key id of the caller's identity
    pub access_key_id: String,
    /// Role requested
    pub role_arn: String,
    /// Session name sent
    pub session_name: String,
    /// Lifetime requested
    pub duration: Duration,
}

/// Mock token-exchange service
///
/// Issues sessions expiring `duration` (or the configured lifetime) after the
/// clock's current time, with access keys `ASIA-MOCK-1`, `ASIA-MOCK-2`, ...
#[derive(Debug)]
pub struct MockDelegationClient {
    clock: Arc<dyn Clock>,
    calls: AtomicU32,
    issued: AtomicU32,
    fail_next: AtomicBool,
    fail_always: AtomicBool,
    failure: Mutex<ExchangeError>,
    lifetime: Option<Duration>,
    delay: Option<Duration>,
    last: Mutex<Option<RecordedExchange>>,
}

impl MockDelegationClient {
    /// Mock that issues sessions relative to `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            calls: AtomicU32::new(0),
            issued: AtomicU32::new(0),
            fail_next: AtomicBool::new(false),
            fail_always: AtomicBool::new(false),
            failure: Mutex::new(ExchangeError::Transport("mock failure".into())),
            lifetime: None,
            delay: None,
            last: Mutex::new(None),
        }
    }

    /// Issue sessions with this lifetime regardless of the requested one
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Set artificial delay before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Error returned by failing calls
    pub fn with_failure(self, failure: ExchangeError) -> Self {
        *self.failure.lock() = failure;
        self
    }

    /// Make next call fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make every call fail until [`recover`](Self::recover)
    pub fn fail_always(&self) {
        self.fail_always.store(true, Ordering::SeqCst);
    }

    /// Stop failing
    pub fn recover(&self) {
        self.fail_always.store(false, Ordering::SeqCst);
        self.fail_next.store(false, Ordering::SeqCst);
    }

    /// Number of `assume_role` calls, failed ones included
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent call
    pub fn last_exchange(&self) -> Option<RecordedExchange> {
        self.last.lock().clone()
    }
}

#[async_trait]
impl DelegationClient for MockDelegationClient {
    async fn assume_role(
        &self,
        identity: &Identity,
        role_arn: &str,
        session_name: &str,
        duration: Duration,
    ) -> Result<DelegatedSession, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(RecordedExchange {
            access_key_id: identity.access_key_id().to_owned(),
            role_arn: role_arn.to_owned(),
            session_name: session_name.to_owned(),
            duration,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_next.swap(false, Ordering::SeqCst) || self.fail_always.load(Ordering::SeqCst)
        {
            return Err(self.failure.lock().clone());
        }

        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let expires_at = self.clock.now() + self.lifetime.unwrap_or(duration);

        Ok(DelegatedSession::new(
            format!("ASIA-MOCK-{n}"),
            format!("mock-secret-{n}"),
            format!("mock-token-{n}"),
            expires_at,
        ))
    }
}

/// Mock host identity service
#[derive(Debug)]
pub struct MockHostIdentity {
    identity: Identity,
    fetches: AtomicU32,
    fail_next: AtomicBool,
    delay: Option<Duration>,
}

impl MockHostIdentity {
    /// Mock returning [`host_identity`]
    pub fn new() -> Self {
        Self::returning(host_identity())
    }

    /// Mock returning `identity`
    pub fn returning(identity: Identity) -> Self {
        Self {
            identity,
            fetches: AtomicU32::new(0),
            fail_next: AtomicBool::new(false),
            delay: None,
        }
    }

    /// Set artificial delay before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make next fetch fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of fetches, failed ones included
    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockHostIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostIdentityClient for MockHostIdentity {
    async fn fetch(&self) -> Result<Identity, AmbientError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AmbientError::Unavailable("mock failure".into()));
        }

        Ok(self.identity.clone())
    }
}
