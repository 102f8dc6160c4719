//! Tempcred CLI
//!
//! - `tempcred resolve --target <URI>` - which credential path serves a target
//! - `tempcred credentials --target <URI>` - print credentials, by default as
//!   `credential_process` JSON so it can back an AWS CLI profile
#![forbid(unsafe_code)]
#![allow(clippy::print_stdout)]

mod cli;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tempcred_credential::{CredentialProvider, ResourceTarget};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = tempcred_log::Config::from_env();
    if cli.verbose {
        log_config.level = "debug".to_string();
    }
    let _log_guard = tempcred_log::init_with(log_config).context("failed to initialize logging")?;

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("configuration file {} does not exist", path.display());
    }
    let config = settings::load(&cli).context("failed to load configuration")?;
    let provider = CredentialProvider::builder(config)
        .build()
        .context("invalid configuration")?;

    match cli.command {
        Command::Resolve(args) => {
            let target = ResourceTarget::new(args.target);
            println!("{}", provider.resolution(&target)?);
        }
        Command::Credentials(args) => {
            let target = ResourceTarget::new(args.target.target);
            let resolution = provider.resolution(&target)?;
            let identity = provider
                .get_credentials(&target)
                .await
                .with_context(|| format!("failed to get credentials for {target}"))?;
            let expires_at = provider.session_expires_at().await;
            println!(
                "{}",
                output::render(args.format, resolution, &identity, expires_at)?
            );
        }
    }

    Ok(())
}
