//! Ready-made identities and configurations

use crate::config::ProviderConfig;
use crate::core::Identity;

/// Role ARN used by fixtures
pub const TEST_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/tempcred-test";

/// Resource prefix used by fixtures
pub const TEST_RESOURCE_PREFIX: &str = "s3://bucket-a/";

/// Complete explicit identity
pub fn explicit_identity() -> Identity {
    Identity::new(
        "AKIAEXPLICIT",
        "explicit-secret",
        Some("explicit-token".into()),
    )
}

/// Identity the mock host returns
pub fn host_identity() -> Identity {
    Identity::new("ASIAHOST", "host-secret", Some("host-token".into()))
}

/// Configuration that delegates targets under [`TEST_RESOURCE_PREFIX`]
pub fn delegated_config() -> ProviderConfig {
    ProviderConfig {
        explicit_identity: Some(explicit_identity()),
        role_arn: Some(TEST_ROLE_ARN.into()),
        resource_prefix: Some(TEST_RESOURCE_PREFIX.into()),
        ..Default::default()
    }
}

/// Configuration that hands out the explicit identity unchanged
pub fn explicit_config() -> ProviderConfig {
    ProviderConfig {
        role_arn: None,
        ..delegated_config()
    }
}
