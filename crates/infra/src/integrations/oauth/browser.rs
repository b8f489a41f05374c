//! Default browser hand-off

use streamgate_core::BrowserLauncher;
use streamgate_domain::{Result, StreamGateError};

/// Opens URLs with the desktop's registered handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenBrowserLauncher;

impl BrowserLauncher for OpenBrowserLauncher {
    fn open(&self, url: &str) -> Result<()> {
        open::that(url).map_err(|e| StreamGateError::Internal(format!("failed to open browser: {e}")))
    }
}
