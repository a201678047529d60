//! Seams between the session controller and the outside world.
//!
//! The browser backend implements [`Launcher`] and [`PageDriver`]; the CLI
//! implements [`CodePrompt`]. Tests use scripted in-memory versions.

use crate::Result;
use crate::locator::Query;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// One open browser tab
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Handle: Send + Sync;

    /// Navigate and wait for the load to finish, up to `timeout`
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Poll for a visible, enabled element matching `query`.
    /// `Ok(None)` means nothing matched within `timeout`.
    async fn find(&self, query: &Query, timeout: Duration) -> Result<Option<Self::Handle>>;

    /// Like [`find`](Self::find), but a visible disabled element also matches.
    /// Only for reading control state; interactions go through `find`.
    async fn find_visible(&self, query: &Query, timeout: Duration) -> Result<Option<Self::Handle>>;

    async fn click(&self, handle: &Self::Handle) -> Result<()>;

    /// Focus, clear and type into an input
    async fn fill(&self, handle: &Self::Handle, text: &str) -> Result<()>;

    async fn press(&self, handle: &Self::Handle, key: &str) -> Result<()>;

    async fn is_enabled(&self, handle: &Self::Handle) -> Result<bool>;

    /// Wait until the current URL contains `fragment`; false on timeout
    async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> Result<bool>;

    /// Wait for the document to finish loading; false on timeout
    async fn wait_until_ready(&self, timeout: Duration) -> Result<bool>;

    /// Wait for any element matching a CSS selector; false on timeout
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Full-page PNG screenshot
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Release the browser. Called exactly once per session.
    async fn close(&mut self) -> Result<()>;
}

/// Acquires a fresh browser for one session
#[async_trait]
pub trait Launcher: Send + Sync {
    type Driver: PageDriver;

    async fn launch(&self) -> Result<Self::Driver>;
}

/// Source of a manually entered two-factor code
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn request_code(&self) -> Result<String>;
}
