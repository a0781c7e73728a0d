//! Browser port

use wrike_domain::GatewayResult;

/// Opens a URL in the user's default browser.
pub trait BrowserLauncher: Send + Sync {
    /// Opens `url`. Returns once the browser has been asked to navigate;
    /// it does not wait for the user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Browser` if no browser could be launched.
    fn open(&self, url: &str) -> GatewayResult<()>;
}
