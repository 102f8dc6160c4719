//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tempcred - resolve temporary AWS credentials for a resource
#[derive(Debug, Parser)]
#[command(name = "tempcred")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file, layered between defaults and environment
    #[arg(long, short = 'c', global = true, env = "TEMPCRED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Role to assume (overrides file and environment)
    #[arg(long, global = true)]
    pub role_arn: Option<String>,

    /// Resource prefix that enables the explicit identity
    #[arg(long, global = true)]
    pub resource_prefix: Option<String>,

    /// STS region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Log at debug level (logs go to stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print which credential path serves a target
    Resolve(TargetArgs),
    /// Print credentials for a target
    Credentials(CredentialsArgs),
}

/// Target selection
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Resource locator, e.g. s3://bucket/key
    #[arg(long, short = 't')]
    pub target: String,
}

/// Arguments for the credentials command
#[derive(Debug, Args)]
pub struct CredentialsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Process)]
    pub format: OutputFormat,
}

/// Credential output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// AWS `credential_process` JSON (Version 1)
    #[default]
    Process,
    /// Shell `export` lines
    Env,
    /// JSON including the resolution path
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_credentials_defaults_to_process_format() {
        let cli = Cli::parse_from(["tempcred", "credentials", "--target", "s3://b/k"]);
        match cli.command {
            Command::Credentials(args) => {
                assert_eq!(args.format, OutputFormat::Process);
                assert_eq!(args.target.target, "s3://b/k");
            }
            Command::Resolve(_) => panic!("expected credentials command"),
        }
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::parse_from([
            "tempcred",
            "resolve",
            "-t",
            "s3://b/k",
            "--role-arn",
            "arn:aws:iam::1:role/r",
            "-v",
        ]);
        assert_eq!(cli.role_arn.as_deref(), Some("arn:aws:iam::1:role/r"));
        assert!(cli.verbose);
    }
}
