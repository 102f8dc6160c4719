//! Integration tests for single-flight renewal under concurrent callers

use std::sync::Arc;
use std::time::{Duration, Instant};
use tempcred_credential::testing::*;
use tempcred_credential::{
    AmbientCredentialSource, CredentialError, CredentialProvider, ResourceTarget,
};

const CALLERS: usize = 32;

fn provider(
    clock: Arc<ManualClock>,
    client: Arc<MockDelegationClient>,
    host: Arc<MockHostIdentity>,
) -> Arc<CredentialProvider> {
    Arc::new(
        CredentialProvider::builder(delegated_config())
            .clock(clock)
            .delegation(client)
            .ambient(Arc::new(AmbientCredentialSource::with_client(host)))
            .build()
            .expect("valid configuration"),
    )
}

async fn request_all(provider: &Arc<CredentialProvider>, locator: &'static str) -> Vec<String> {
    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move {
                provider
                    .get_credentials(&ResourceTarget::new(locator))
                    .await
                    .map(|identity| identity.access_key_id().to_owned())
            })
        })
        .collect();

    let mut keys = Vec::with_capacity(CALLERS);
    for handle in handles {
        keys.push(handle.await.expect("task panicked").expect("credentials"));
    }
    keys
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_callers_on_empty_cache_trigger_one_exchange() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_700_000_000));
    let client = Arc::new(
        MockDelegationClient::new(clock.clone()).with_delay(Duration::from_millis(100)),
    );
    let provider = provider(clock, client.clone(), Arc::new(MockHostIdentity::new()));

    let keys = request_all(&provider, "s3://bucket-a/key").await;

    assert_eq!(client.call_count(), 1);
    assert!(keys.iter().all(|k| k == "ASIA-MOCK-1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_callers_on_stale_cache_trigger_one_exchange() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_700_000_000));
    let client = Arc::new(
        MockDelegationClient::new(clock.clone()).with_delay(Duration::from_millis(50)),
    );
    let provider = provider(clock.clone(), client.clone(), Arc::new(MockHostIdentity::new()));

    request_all(&provider, "s3://bucket-a/key").await;
    clock.advance(Duration::from_secs(3590));

    let keys = request_all(&provider, "s3://bucket-a/key").await;

    assert_eq!(client.call_count(), 2);
    assert!(keys.iter().all(|k| k == "ASIA-MOCK-2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_failing_renewal_on_stale_cache_is_not_repeated_by_waiters() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_700_000_000));
    let client = Arc::new(
        MockDelegationClient::new(clock.clone()).with_delay(Duration::from_millis(100)),
    );
    let provider = provider(clock.clone(), client.clone(), Arc::new(MockHostIdentity::new()));

    request_all(&provider, "s3://bucket-a/key").await;
    client.fail_always();
    clock.advance(Duration::from_secs(3590));

    let started = Instant::now();
    let keys = request_all(&provider, "s3://bucket-a/key").await;

    assert_eq!(client.call_count(), 2);
    assert!(keys.iter().all(|k| k == "ASIA-MOCK-1"));
    assert!(started.elapsed() < Duration::from_secs(1));

    let stats = provider.cache_stats().expect("delegated provider");
    assert_eq!(stats.failed_renewals, 1);
    assert_eq!(stats.degraded_fallbacks, CALLERS as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_failing_renewal_on_empty_cache_fails_every_waiter_once() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_700_000_000));
    let client = Arc::new(
        MockDelegationClient::new(clock.clone()).with_delay(Duration::from_millis(100)),
    );
    client.fail_always();
    let provider = provider(clock, client.clone(), Arc::new(MockHostIdentity::new()));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move {
                provider
                    .get_credentials(&ResourceTarget::new("s3://bucket-a/key"))
                    .await
            })
        })
        .collect();
    for handle in handles {
        let err = handle.await.expect("task panicked").unwrap_err();
        assert!(matches!(err, CredentialError::Delegation { .. }));
    }

    assert_eq!(client.call_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_ambient_first_use_fetches_once() {
    let clock = Arc::new(ManualClock::at_unix_secs(1_700_000_000));
    let client = Arc::new(MockDelegationClient::new(clock.clone()));
    let host = Arc::new(MockHostIdentity::new().with_delay(Duration::from_millis(100)));
    let provider = provider(clock, client.clone(), host.clone());

    let keys = request_all(&provider, "s3://bucket-b/key").await;

    assert_eq!(host.fetch_count(), 1);
    assert_eq!(client.call_count(), 0);
    assert!(keys.iter().all(|k| k == "ASIAHOST"));
}
