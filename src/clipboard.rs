//! Clipboard access as an injected capability.
//!
//! The vault never talks to the OS clipboard directly; callers pass a
//! `ClipboardProvider`.  `NoClipboard` is the variant for headless
//! environments and tests.

use crate::errors::{OtpVaultError, Result};

/// Something that can receive a copied code.
pub trait ClipboardProvider {
    fn copy(&mut self, text: &str) -> Result<()>;

    /// Whether `copy` can possibly succeed.
    fn is_available(&self) -> bool {
        true
    }
}

/// The desktop clipboard, via `arboard`.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    /// Connect to the system clipboard.  Fails on headless systems.
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| OtpVaultError::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_owned())
            .map_err(|e| OtpVaultError::Clipboard(e.to_string()))
    }
}

/// A clipboard that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

impl ClipboardProvider for NoClipboard {
    fn copy(&mut self, _text: &str) -> Result<()> {
        Err(OtpVaultError::Clipboard("no clipboard available".into()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// The system clipboard if one can be opened, `NoClipboard` otherwise.
pub fn detect() -> Box<dyn ClipboardProvider> {
    match SystemClipboard::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(e) => {
            tracing::debug!(error = %e, "system clipboard unavailable");
            Box::new(NoClipboard)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_clipboard_reports_unavailable() {
        let mut clip = NoClipboard;
        assert!(!clip.is_available());
        assert!(matches!(clip.copy("123456"), Err(OtpVaultError::Clipboard(_))));
    }
}
