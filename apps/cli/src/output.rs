//! Credential rendering

use crate::cli::OutputFormat;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::time::SystemTime;
use tempcred_credential::{Identity, Resolution};

/// `credential_process` output, see the AWS CLI documentation on sourcing
/// credentials with an external process
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProcessCredentials {
    version: u8,
    access_key_id: String,
    secret_access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<String>,
}

#[derive(Debug, Serialize)]
struct JsonCredentials {
    resolution: Resolution,
    access_key_id: String,
    secret_access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<String>,
}

/// Render `identity` in `format`
pub fn render(
    format: OutputFormat,
    resolution: Resolution,
    identity: &Identity,
    expires_at: Option<SystemTime>,
) -> Result<String, serde_json::Error> {
    let access_key_id = identity.access_key_id().to_owned();
    let secret_access_key = identity.secret_access_key().expose_secret(str::to_owned);
    let session_token = identity
        .session_token()
        .map(|token| token.expose_secret(str::to_owned));
    let expiration = expires_at.map(rfc3339);

    match format {
        OutputFormat::Process => serde_json::to_string_pretty(&ProcessCredentials {
            version: 1,
            access_key_id,
            secret_access_key,
            session_token,
            expiration,
        }),
        OutputFormat::Json => serde_json::to_string_pretty(&JsonCredentials {
            resolution,
            access_key_id,
            secret_access_key,
            session_token,
            expiration,
        }),
        OutputFormat::Env => {
            let mut lines = vec![
                format!("export AWS_ACCESS_KEY_ID={access_key_id}"),
                format!("export AWS_SECRET_ACCESS_KEY={secret_access_key}"),
            ];
            if let Some(token) = session_token {
                lines.push(format!("export AWS_SESSION_TOKEN={token}"));
            }
            if let Some(expiration) = expiration {
                lines.push(format!("export AWS_CREDENTIAL_EXPIRATION={expiration}"));
            }
            Ok(lines.join("\n"))
        }
    }
}

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    fn identity() -> Identity {
        Identity::new("ASIAEXAMPLE", "secret", Some("token".into()))
    }

    #[test]
    fn test_process_format() {
        let out = render(
            OutputFormat::Process,
            Resolution::DelegatedRole,
            &identity(),
            Some(UNIX_EPOCH + Duration::from_secs(1_700_003_600)),
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Version": 1,
                "AccessKeyId": "ASIAEXAMPLE",
                "SecretAccessKey": "secret",
                "SessionToken": "token",
                "Expiration": "2023-11-14T23:13:20Z",
            })
        );
    }

    #[test]
    fn test_process_format_without_expiry() {
        let out = render(
            OutputFormat::Process,
            Resolution::ExplicitSession,
            &identity(),
            None,
        )
        .unwrap();
        assert!(!out.contains("Expiration"));
    }

    #[test]
    fn test_env_format() {
        let out = render(
            OutputFormat::Env,
            Resolution::Ambient,
            &Identity::new("AKIAEXAMPLE", "secret", None),
            None,
        )
        .unwrap();
        assert_eq!(
            out,
            "export AWS_ACCESS_KEY_ID=AKIAEXAMPLE\nexport AWS_SECRET_ACCESS_KEY=secret"
        );
    }

    #[test]
    fn test_json_format_names_resolution() {
        let out = render(OutputFormat::Json, Resolution::Ambient, &identity(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["resolution"], "ambient");
        assert_eq!(value["session_token"], "token");
    }
}
