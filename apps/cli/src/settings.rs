//! Layered provider configuration
//!
//! Defaults, then the optional TOML file, then `TEMPCRED_*` environment
//! variables, then command-line flags. Durations are humantime strings
//! (`session_duration = "1h"`, `TEMPCRED_RENEWAL_SKEW=90s`).
//!
//! The short identity variables (`TEMPCRED_ACCESS_KEY_ID`,
//! `TEMPCRED_SECRET_ACCESS_KEY`, `TEMPCRED_SESSION_TOKEN`) fill
//! `explicit_identity`; `AWS_ROLE_ARN` is used when no role is set anywhere
//! else. The numeric `TEMPCRED_SESSION_DURATION_SECS`,
//! `TEMPCRED_RENEWAL_SKEW_MILLIS` and `TEMPCRED_EXCHANGE_TIMEOUT_SECS` are
//! honored too and take precedence over their humantime counterparts.

use crate::cli::Cli;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::value::Uncased;
use tempcred_credential::ProviderConfig;
use tempcred_credential::config::{env_lookup, keys};

const ENV_PREFIX: &str = "TEMPCRED_";

/// Variables that are not read as provider fields by the env layer
const IGNORED_ENV: &[&str] = &[
    "config",
    "log",
    "log_format",
    "session_duration_secs",
    "renewal_skew_millis",
    "exchange_timeout_secs",
];

/// Build the layered figment for `cli`
pub fn figment(cli: &Cli) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(ProviderConfig::default()));

    if let Some(path) = &cli.config {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(IGNORED_ENV)
            .map(identity_alias)
            .split("__"),
    );

    if let Some(role_arn) = &cli.role_arn {
        figment = figment.merge(Serialized::default("role_arn", role_arn));
    }
    if let Some(prefix) = &cli.resource_prefix {
        figment = figment.merge(Serialized::default("resource_prefix", prefix));
    }
    if let Some(region) = &cli.region {
        figment = figment.merge(Serialized::default("region", region));
    }

    figment
}

/// Extract the provider configuration for `cli`
pub fn load(cli: &Cli) -> Result<ProviderConfig, figment::Error> {
    let mut config: ProviderConfig = figment(cli).extract()?;
    config = config
        .with_duration_overrides(env_lookup)
        .map_err(|e| figment::Error::from(e.to_string()))?;

    if config.role_arn().is_none()
        && let Ok(role_arn) = std::env::var(keys::ROLE_ARN_FALLBACK)
        && !role_arn.trim().is_empty()
    {
        tracing::warn!(
            key = keys::ROLE_ARN_FALLBACK,
            role_arn = %role_arn,
            "No role configured; using role from fallback variable"
        );
        config.role_arn = Some(role_arn.trim().to_string());
    }

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

fn identity_alias(key: &figment::value::UncasedStr) -> Uncased<'_> {
    match key.as_str().to_ascii_lowercase().as_str() {
        field @ ("access_key_id" | "secret_access_key" | "session_token") => {
            format!("explicit_identity.{field}").into()
        }
        _ => key.into(),
    }
}
