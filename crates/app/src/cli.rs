//! Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use wrike_application::GatewayConfig;
use wrike_domain::ApiCall;
use wrike_infrastructure::{ConfigError, ConfigLoader};

/// Wrike API client with browser-based OAuth2 login.
#[derive(Parser, Debug)]
#[command(name = "wrike")]
#[command(version)]
#[command(about = "Call the Wrike API with an OAuth2 token obtained through the browser")]
pub struct Cli {
    /// Configuration file (default: ./wrike.{toml,yaml,json} if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Token file, overriding the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub token_file: Option<PathBuf>,

    /// Print the authorization URL instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in through the browser unless a token is already stored
    Login {
        /// After login, redirect the browser tab to this URL
        #[arg(long, value_name = "URL")]
        redirect: Option<String>,
    },

    /// Call a registered API operation
    Call {
        /// Operation name (see `wrike apis`)
        api: String,

        /// Path placeholder value
        #[arg(long = "path", value_name = "KEY=VALUE", value_parser = parse_path_arg)]
        path_args: Vec<(String, String)>,

        /// Query or form parameter; JSON values are sent as JSON
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },

    /// List registered API operations
    Apis,

    /// Remove the stored token
    Logout,
}

impl Cli {
    /// Loads the layered configuration and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be loaded.
    pub fn load_config(&self) -> Result<GatewayConfig, ConfigError> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        let mut config = loader.load()?;

        if let Some(token_file) = &self.token_file {
            config.token_file = Some(token_file.clone());
        }
        if matches!(self.command, Command::Login { redirect: Some(_) }) {
            config.wait_for_redirect = true;
        }
        Ok(config)
    }
}

impl Command {
    /// Builds the `ApiCall` for a `call` subcommand.
    #[must_use]
    pub fn api_call(&self) -> Option<ApiCall> {
        let Self::Call {
            api,
            path_args,
            params,
        } = self
        else {
            return None;
        };

        let mut call = ApiCall::new(api.clone());
        for (name, value) in path_args {
            call = call.path_arg(name.clone(), value.clone());
        }
        for (name, value) in params {
            call = call.param(name.clone(), value.clone());
        }
        Some(call)
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

fn parse_path_arg(raw: &str) -> Result<(String, String), String> {
    let (key, value) = split_pair(raw)?;
    Ok((key.to_string(), value.to_string()))
}

/// Values that parse as JSON (`true`, `3`, `["a","b"]`) keep their type;
/// anything else is a string.
fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = split_pair(raw)?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}
