//! Adapters for the callback listener, HTTP transport and system browser

mod callback_listener;
mod reqwest_client;
mod system_browser;

pub use callback_listener::LocalCallbackListener;
pub use reqwest_client::ReqwestApiTransport;
pub use system_browser::{PrintingBrowser, SystemBrowser};
