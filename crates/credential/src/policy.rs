//! Resolution policy: which credential path serves a target
//!
//! The decision is a pure function of the target and the configuration. It
//! never looks at cached session state.

use crate::config::ProviderConfig;
use crate::core::ResourceTarget;
use serde::Serialize;
use std::fmt;

/// Credential path chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Hand out the configured identity unchanged
    ExplicitSession,
    /// Exchange the configured identity for a delegated session
    DelegatedRole,
    /// Use the host's ambient identity
    Ambient,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExplicitSession => "explicit_session",
            Self::DelegatedRole => "delegated_role",
            Self::Ambient => "ambient",
        })
    }
}

/// Decide the credential path for `target`
///
/// The explicit identity is used only when it is complete and the target
/// falls under the configured resource prefix. An absent or empty prefix
/// matches every target. With a role configured the identity is exchanged,
/// otherwise it is returned as-is. Everything else falls back to ambient.
///
/// # Example
///
/// ```
/// use tempcred_credential::{Identity, ProviderConfig, ResourceTarget};
/// use tempcred_credential::policy::{Resolution, resolve};
///
/// let config = ProviderConfig {
///     explicit_identity: Some(Identity::new("AKIA", "secret", Some("token".into()))),
///     role_arn: Some("arn:aws:iam::123:role/X".into()),
///     resource_prefix: Some("s3://bucket-a/".into()),
///     ..Default::default()
/// };
///
/// assert_eq!(resolve(&ResourceTarget::new("s3://bucket-a/key"), &config), Resolution::DelegatedRole);
/// assert_eq!(resolve(&ResourceTarget::new("s3://bucket-b/key"), &config), Resolution::Ambient);
/// ```
pub fn resolve(target: &ResourceTarget, config: &ProviderConfig) -> Resolution {
    if config.complete_identity().is_none() || !target.is_within(config.resource_prefix()) {
        return Resolution::Ambient;
    }

    if config.role_arn().is_some() {
        Resolution::DelegatedRole
    } else {
        Resolution::ExplicitSession
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Identity;
    use proptest::prelude::*;
    use rstest::rstest;

    const ROLE: &str = "arn:aws:iam::123:role/X";

    fn config(
        identity: Option<Identity>,
        role_arn: Option<&str>,
        resource_prefix: Option<&str>,
    ) -> ProviderConfig {
        ProviderConfig {
            explicit_identity: identity,
            role_arn: role_arn.map(str::to_owned),
            resource_prefix: resource_prefix.map(str::to_owned),
            ..Default::default()
        }
    }

    fn complete() -> Identity {
        Identity::new("AKIAEXAMPLE", "secret", Some("token".into()))
    }

    #[rstest]
    #[case::delegated_inside_prefix(Some(complete()), Some(ROLE), Some("s3://bucket-a/"), "s3://bucket-a/key", Resolution::DelegatedRole)]
    #[case::ambient_outside_prefix(Some(complete()), Some(ROLE), Some("s3://bucket-a/"), "s3://bucket-b/key", Resolution::Ambient)]
    #[case::explicit_without_role(Some(complete()), None, Some("s3://bucket-a/"), "s3://bucket-a/key", Resolution::ExplicitSession)]
    #[case::empty_role_is_no_role(Some(complete()), Some(""), None, "s3://bucket-a/key", Resolution::ExplicitSession)]
    #[case::unset_prefix_always_matches(Some(complete()), Some(ROLE), None, "gs://elsewhere/key", Resolution::DelegatedRole)]
    #[case::empty_prefix_always_matches(Some(complete()), None, Some(""), "gs://elsewhere/key", Resolution::ExplicitSession)]
    #[case::incomplete_identity(Some(Identity::new("AKIAEXAMPLE", "secret", None)), Some(ROLE), None, "s3://bucket-a/key", Resolution::Ambient)]
    #[case::no_identity(None, Some(ROLE), None, "s3://bucket-a/key", Resolution::Ambient)]
    fn test_resolve(
        #[case] identity: Option<Identity>,
        #[case] role_arn: Option<&str>,
        #[case] prefix: Option<&str>,
        #[case] locator: &str,
        #[case] expected: Resolution,
    ) {
        let config = config(identity, role_arn, prefix);
        assert_eq!(resolve(&ResourceTarget::new(locator), &config), expected);
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(Resolution::DelegatedRole.to_string(), "delegated_role");
        assert_eq!(
            serde_json::to_string(&Resolution::ExplicitSession).unwrap(),
            "\"explicit_session\""
        );
    }

    proptest! {
        #[test]
        fn prop_complete_identity_inside_prefix_never_ambient(
            prefix in "[a-z0-9:/._-]{0,16}",
            suffix in "[a-z0-9/._-]{0,16}",
            with_role in any::<bool>(),
        ) {
            let config = config(Some(complete()), with_role.then_some(ROLE), Some(&prefix));
            let target = ResourceTarget::new(format!("{prefix}{suffix}"));
            prop_assert_ne!(resolve(&target, &config), Resolution::Ambient);
        }

        #[test]
        fn prop_no_identity_always_ambient(
            locator in ".{0,32}",
            prefix in proptest::option::of("[a-z0-9:/._-]{0,16}"),
            with_role in any::<bool>(),
        ) {
            let config = config(None, with_role.then_some(ROLE), prefix.as_deref());
            prop_assert_eq!(resolve(&ResourceTarget::new(locator), &config), Resolution::Ambient);
        }
    }
}
