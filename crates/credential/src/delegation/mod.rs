//! Token exchange: trading a long-lived identity for a delegated session
//!
//! Implementations perform exactly one exchange per call. Retrying, timing
//! out and falling back are the cache's business.

use crate::core::{DelegatedSession, ExchangeError, Identity};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

mod sts;

pub use sts::StsDelegationClient;

/// Performs a role-assumption exchange
#[async_trait]
pub trait DelegationClient: Send + Sync + fmt::Debug {
    /// Assume `role_arn` with `identity`, naming the session `session_name`
    ///
    /// # Errors
    ///
    /// `ExchangeError` on any transport, authorization or response problem.
    async fn assume_role(
        &self,
        identity: &Identity,
        role_arn: &str,
        session_name: &str,
        duration: Duration,
    ) -> Result<DelegatedSession, ExchangeError>;
}
