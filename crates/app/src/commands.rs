//! Subcommand execution.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use wrike_application::{CancellationReceiver, CancellationToken, OAuth2Gateway};
use wrike_domain::{ApiRegistry, ApiResponse, AuthInfo, token_preview, wrike_registry};
use wrike_infrastructure::{PrintingBrowser, gateway_builder};

use crate::cli::{Cli, Command};

/// Result of a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything succeeded.
    Success,
    /// The API answered with a non-2xx status.
    UpstreamError,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => Self::SUCCESS,
            Outcome::UpstreamError => Self::from(2u8),
        }
    }
}

/// Loads configuration, wires the production adapters and runs the
/// subcommand. Ctrl-C cancels a pending login or call.
///
/// # Errors
///
/// Returns configuration, gateway and output errors.
pub async fn run(cli: Cli, out: &mut dyn Write) -> Result<Outcome> {
    if cli.command == Command::Apis {
        return list_apis(&wrike_registry(), out);
    }

    let config = cli.load_config().context("failed to load configuration")?;
    if config.token_file.is_none() {
        tracing::warn!("no token file configured, tokens will not be kept");
    }

    let mut builder = gateway_builder(config)?;
    if cli.no_browser {
        builder = builder.browser(Arc::new(PrintingBrowser));
    }
    let gateway = builder.build()?;

    let (token, cancel) = CancellationToken::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted");
            token.cancel();
        }
    });

    execute(&cli.command, &gateway, cancel, out).await
}

/// Runs `command` against an already built gateway.
///
/// # Errors
///
/// Returns gateway and output errors.
pub async fn execute(
    command: &Command,
    gateway: &OAuth2Gateway,
    cancel: CancellationReceiver,
    out: &mut dyn Write,
) -> Result<Outcome> {
    match command {
        Command::Login { redirect } => {
            let auth_info = gateway.login(cancel).await?;
            print_tokens(&auth_info, out)?;
            if let Some(location) = redirect {
                gateway.redirect(location).await;
            }
            Ok(Outcome::Success)
        }
        Command::Call { api, .. } => {
            let call = command
                .api_call()
                .with_context(|| format!("not a call: {api}"))?;
            let response = gateway.call_with_cancellation(call, cancel).await?;
            print_response(&response, out)?;
            if response.is_success() {
                Ok(Outcome::Success)
            } else {
                Ok(Outcome::UpstreamError)
            }
        }
        Command::Apis => list_apis(gateway.registry(), out),
        Command::Logout => {
            gateway.logout().await?;
            writeln!(out, "Logged out")?;
            Ok(Outcome::Success)
        }
    }
}

fn print_tokens(auth_info: &AuthInfo, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "access_token:  {}", token_preview(&auth_info.access_token))?;
    writeln!(out, "refresh_token: {}", token_preview(&auth_info.refresh_token))?;
    if let Some(host) = auth_info.host() {
        writeln!(out, "host:          {host}")?;
    }
    Ok(())
}

fn print_response(response: &ApiResponse, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", response.status)?;
    if !response.body.is_null() {
        writeln!(out, "{}", serde_json::to_string_pretty(&response.body)?)?;
    }
    Ok(())
}

fn list_apis(registry: &ApiRegistry, out: &mut dyn Write) -> Result<Outcome> {
    let width = registry.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, descriptor) in registry.iter() {
        writeln!(
            out,
            "{name:<width$}  {:<6}  {}",
            descriptor.method.as_str(),
            descriptor.path
        )?;
    }
    Ok(Outcome::Success)
}
