//! Integration tests for resolution paths through the public provider API

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use tempcred_credential::testing::*;
use tempcred_credential::{
    AmbientCredentialSource, ConfigError, CredentialError, CredentialProvider,
    CredentialProviderBuilder, ProviderConfig, Resolution, ResourceTarget,
};

const T0: u64 = 1_700_000_000;

fn provider_with(
    config: ProviderConfig,
    ambient: Arc<AmbientCredentialSource>,
) -> (CredentialProvider, Arc<MockDelegationClient>) {
    let clock = Arc::new(ManualClock::at_unix_secs(T0));
    let client = Arc::new(MockDelegationClient::new(clock.clone()));
    let provider = CredentialProvider::builder(config)
        .clock(clock)
        .delegation(client.clone())
        .ambient(ambient)
        .build()
        .expect("valid configuration");
    (provider, client)
}

#[rstest]
#[case::inside_prefix("s3://bucket-a/key", Resolution::DelegatedRole)]
#[case::outside_prefix("s3://bucket-b/key", Resolution::Ambient)]
fn test_documented_scenario(#[case] locator: &str, #[case] expected: Resolution) {
    let config = ProviderConfig {
        role_arn: Some("arn:aws:iam::123:role/X".into()),
        ..delegated_config()
    };
    let (provider, _) = provider_with(
        config,
        Arc::new(AmbientCredentialSource::with_client(Arc::new(
            MockHostIdentity::new(),
        ))),
    );

    assert_eq!(
        provider.resolution(&ResourceTarget::new(locator)).unwrap(),
        expected
    );
}

#[tokio::test]
async fn test_ambient_source_shared_between_providers() {
    let host = Arc::new(MockHostIdentity::new());
    let ambient = Arc::new(AmbientCredentialSource::with_client(host.clone()));

    let (first, _) = provider_with(ProviderConfig::default(), ambient.clone());
    let (second, _) = provider_with(delegated_config(), ambient.clone());

    let a = first
        .get_credentials(&"s3://anything/key".into())
        .await
        .unwrap();
    let b = second
        .get_credentials(&"s3://bucket-b/key".into())
        .await
        .unwrap();

    assert_eq!(a, host_identity());
    assert_eq!(a, b);
    assert_eq!(host.fetch_count(), 1);
    assert!(ambient.is_populated());
}

#[tokio::test]
async fn test_incomplete_identity_falls_back_to_ambient() {
    let host = Arc::new(MockHostIdentity::new());
    let config = ProviderConfig {
        explicit_identity: Some(tempcred_credential::Identity::new(
            "AKIAEXPLICIT",
            "explicit-secret",
            None,
        )),
        ..delegated_config()
    };
    let (provider, client) = provider_with(
        config,
        Arc::new(AmbientCredentialSource::with_client(host.clone())),
    );

    let identity = provider
        .get_credentials(&"s3://bucket-a/key".into())
        .await
        .unwrap();

    assert_eq!(identity, host_identity());
    assert_eq!(client.call_count(), 0);
    assert_eq!(provider.cache_state().await, None);
}

#[tokio::test]
async fn test_config_from_lookup_drives_provider() {
    let lookup = |key: &str| -> Result<Option<String>, ConfigError> {
        Ok(match key {
            "TEMPCRED_ACCESS_KEY_ID" => Some("AKIAEXPLICIT".to_string()),
            "TEMPCRED_SECRET_ACCESS_KEY" => Some("explicit-secret".to_string()),
            "TEMPCRED_SESSION_TOKEN" => Some("explicit-token".to_string()),
            "AWS_ROLE_ARN" => Some(TEST_ROLE_ARN.to_string()),
            "TEMPCRED_RESOURCE_PREFIX" => Some(TEST_RESOURCE_PREFIX.to_string()),
            _ => None,
        })
    };
    let config = ProviderConfig::from_lookup(lookup).unwrap();
    let (provider, client) = provider_with(
        config,
        Arc::new(AmbientCredentialSource::with_client(Arc::new(
            MockHostIdentity::new(),
        ))),
    );

    let identity = provider
        .get_credentials(&"s3://bucket-a/key".into())
        .await
        .unwrap();

    assert_eq!(identity.access_key_id(), "ASIA-MOCK-1");
    assert_eq!(client.last_exchange().unwrap().role_arn, TEST_ROLE_ARN);
}

#[tokio::test]
async fn test_failed_lookup_surfaces_on_first_request() {
    let lookup = |key: &str| -> Result<Option<String>, ConfigError> {
        Ok((key == "TEMPCRED_RENEWAL_SKEW_MILLIS").then(|| "sixty".to_string()))
    };
    let provider =
        CredentialProviderBuilder::from_lookup(ProviderConfig::from_lookup(lookup)).build_deferred();

    let err = provider
        .get_credentials(&"s3://bucket-a/key".into())
        .await
        .unwrap_err();

    match err {
        CredentialError::Initialization {
            source: ConfigError::InvalidValue { field, .. },
        } => assert_eq!(field, "TEMPCRED_RENEWAL_SKEW_MILLIS"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_eager_build_reports_configuration_error() {
    let config = ProviderConfig {
        renewal_skew: std::time::Duration::from_secs(7200),
        ..delegated_config()
    };

    let err = CredentialProvider::builder(config).build().unwrap_err();
    assert!(matches!(err, CredentialError::Configuration { .. }));
    assert!(!err.is_transient());
}
