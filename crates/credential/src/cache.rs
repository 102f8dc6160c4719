//! Delegated session cache with skew-based renewal
//!
//! One cache holds at most one [`DelegatedSession`]. Readers take the shared
//! lock and return the cached session while it is fresh; the first reader
//! to find it stale takes the exclusive lock, re-checks, and renews. Callers
//! that queued behind the renewal observe its outcome on re-check: the new
//! session, or after a failure the previous session (or the same error).
//! A burst of concurrent requests therefore causes a single exchange.

use crate::clock::Clock;
use crate::config::ProviderConfig;
use crate::core::{CredentialError, DelegatedSession, ExchangeError, Identity, Result, unix_millis};
use crate::delegation::DelegationClient;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Parameters of each renewal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalSettings {
    /// Lifetime requested for each session
    pub session_duration: Duration,
    /// Renew once `now >= expires_at - renewal_skew`
    pub renewal_skew: Duration,
    /// Upper bound on one exchange
    pub exchange_timeout: Duration,
    /// Session name prefix; the current Unix time in milliseconds is appended
    pub session_name_prefix: String,
}

impl RenewalSettings {
    /// Take the renewal fields of a provider configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            session_duration: config.session_duration,
            renewal_skew: config.renewal_skew,
            exchange_timeout: config.exchange_timeout,
            session_name_prefix: config.session_name_prefix.clone(),
        }
    }
}

impl Default for RenewalSettings {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

/// Observable state of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// No session has been obtained yet
    Empty,
    /// The cached session is outside the renewal window
    Fresh,
    /// The cached session needs renewal (it may still be usable as a fallback)
    Stale,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        })
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests served from a fresh cached session
    pub hits: u64,
    /// Successful exchanges
    pub renewals: u64,
    /// Failed exchanges
    pub failed_renewals: u64,
    /// Requests answered with the previous session after a failed exchange
    pub degraded_fallbacks: u64,
}

/// Cached session plus the latest failed exchange
#[derive(Debug, Default)]
struct Slot {
    session: Option<DelegatedSession>,
    last_failure: Option<(Instant, ExchangeError)>,
}

/// Holds the current delegated session and renews it on demand
pub struct CredentialCache {
    slot: RwLock<Slot>,
    clock: Arc<dyn Clock>,
    settings: RenewalSettings,
    hits: AtomicU64,
    renewals: AtomicU64,
    failed_renewals: AtomicU64,
    degraded_fallbacks: AtomicU64,
}

impl CredentialCache {
    /// Empty cache
    pub fn new(settings: RenewalSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(Slot::default()),
            clock,
            settings,
            hits: AtomicU64::new(0),
            renewals: AtomicU64::new(0),
            failed_renewals: AtomicU64::new(0),
            degraded_fallbacks: AtomicU64::new(0),
        }
    }

    /// Cached session if fresh, otherwise a renewed one
    ///
    /// # Errors
    ///
    /// [`CredentialError::Delegation`] when the exchange fails and there is
    /// no previous session that is still before its hard expiry.
    pub async fn get_or_renew(
        &self,
        client: &dyn DelegationClient,
        identity: &Identity,
        role_arn: &str,
    ) -> Result<DelegatedSession> {
        let arrived = Instant::now();
        {
            let slot = self.slot.read().await;
            if let Some(session) = self.fresh(&slot) {
                return Ok(session);
            }
        }

        let mut slot = self.slot.write().await;

        // Someone else may have renewed while we waited for the write lock
        if let Some(session) = self.fresh(&slot) {
            return Ok(session);
        }

        // ...or tried and failed; share that outcome instead of exchanging again
        if let Some((failed_at, source)) = &slot.last_failure
            && *failed_at > arrived
        {
            let source = source.clone();
            tracing::debug!(role_arn, error = %source, "Joining failed renewal");
            return self.fall_back(&slot, role_arn, source);
        }

        self.renew(&mut slot, client, identity, role_arn).await
    }

    /// Renew now, regardless of freshness
    ///
    /// Failure handling matches [`get_or_renew`](Self::get_or_renew).
    pub async fn force_renew(
        &self,
        client: &dyn DelegationClient,
        identity: &Identity,
        role_arn: &str,
    ) -> Result<DelegatedSession> {
        let mut slot = self.slot.write().await;
        self.renew(&mut slot, client, identity, role_arn).await
    }

    /// Current state
    pub async fn state(&self) -> CacheState {
        match self.slot.read().await.session.as_ref() {
            None => CacheState::Empty,
            Some(session) if session.is_fresh(self.clock.now(), self.settings.renewal_skew) => {
                CacheState::Fresh
            }
            Some(_) => CacheState::Stale,
        }
    }

    /// Cached session, fresh or not
    pub async fn current(&self) -> Option<DelegatedSession> {
        self.slot.read().await.session.clone()
    }

    /// Counter snapshot
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            renewals: self.renewals.load(Ordering::Relaxed),
            failed_renewals: self.failed_renewals.load(Ordering::Relaxed),
            degraded_fallbacks: self.degraded_fallbacks.load(Ordering::Relaxed),
        }
    }

    fn fresh(&self, slot: &Slot) -> Option<DelegatedSession> {
        let session = slot
            .session
            .as_ref()
            .filter(|s| s.is_fresh(self.clock.now(), self.settings.renewal_skew))?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            access_key_id = %session.access_key_id(),
            "Serving cached delegated session"
        );
        Some(session.clone())
    }

    async fn renew(
        &self,
        slot: &mut Slot,
        client: &dyn DelegationClient,
        identity: &Identity,
        role_arn: &str,
    ) -> Result<DelegatedSession> {
        match self.exchange(client, identity, role_arn).await {
            Ok(session) => {
                self.renewals.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    role_arn,
                    access_key_id = %session.access_key_id(),
                    expires_at_ms = unix_millis(session.expires_at()),
                    "Delegated session renewed"
                );
                slot.session = Some(session.clone());
                slot.last_failure = None;
                Ok(session)
            }
            Err(source) => {
                self.failed_renewals.fetch_add(1, Ordering::Relaxed);
                match slot.session.as_ref() {
                    Some(previous) if !previous.is_expired(self.clock.now()) => tracing::warn!(
                        role_arn,
                        error = %source,
                        expires_at_ms = unix_millis(previous.expires_at()),
                        "Session renewal failed, serving previous session until it expires"
                    ),
                    _ => tracing::error!(role_arn, error = %source, "Session renewal failed"),
                }
                slot.last_failure = Some((Instant::now(), source.clone()));
                self.fall_back(slot, role_arn, source)
            }
        }
    }

    /// Previous session while it has not hard-expired, otherwise the failure
    fn fall_back(
        &self,
        slot: &Slot,
        role_arn: &str,
        source: ExchangeError,
    ) -> Result<DelegatedSession> {
        match slot.session.as_ref() {
            Some(previous) if !previous.is_expired(self.clock.now()) => {
                self.degraded_fallbacks.fetch_add(1, Ordering::Relaxed);
                Ok(previous.clone())
            }
            _ => Err(CredentialError::Delegation {
                role_arn: role_arn.to_owned(),
                source,
            }),
        }
    }

    async fn exchange(
        &self,
        client: &dyn DelegationClient,
        identity: &Identity,
        role_arn: &str,
    ) -> std::result::Result<DelegatedSession, ExchangeError> {
        let settings = &self.settings;
        let session_name = format!(
            "{}{}",
            settings.session_name_prefix,
            unix_millis(self.clock.now())
        );

        tracing::debug!(role_arn, session_name = %session_name, "Exchanging identity");

        let session = tokio::time::timeout(
            settings.exchange_timeout,
            client.assume_role(identity, role_arn, &session_name, settings.session_duration),
        )
        .await
        .map_err(|_| ExchangeError::Timeout {
            duration: settings.exchange_timeout,
        })??;

        if !session.is_fresh(self.clock.now(), settings.renewal_skew) {
            return Err(ExchangeError::MalformedResponse(format!(
                "session expiring at {} ms is already inside the renewal window",
                unix_millis(session.expires_at())
            )));
        }

        Ok(session)
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("settings", &self.settings)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
