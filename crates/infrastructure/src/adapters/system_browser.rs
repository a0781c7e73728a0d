//! System browser adapter

use wrike_application::ports::BrowserLauncher;
use wrike_domain::{GatewayError, GatewayResult};

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    /// Creates a new system browser launcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> GatewayResult<()> {
        open::that(url).map_err(|e| GatewayError::Browser(e.to_string()))
    }
}

/// Launcher that only logs the URL, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintingBrowser;

impl BrowserLauncher for PrintingBrowser {
    fn open(&self, url: &str) -> GatewayResult<()> {
        tracing::info!(url, "open this URL to authorize");
        Ok(())
    }
}
