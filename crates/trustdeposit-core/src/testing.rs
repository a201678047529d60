//! Scripted in-memory driver, launcher and prompts for unit tests.

use crate::driver::{CodePrompt, Launcher, PageDriver};
use crate::locator::Query;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Goto(String),
    Find(Query),
    FindVisible(Query),
    Click(Query),
    Fill(Query, String),
    Press(Query, String),
    Screenshot(String),
    Close,
}

/// How the fake page responds
#[derive(Debug, Clone)]
pub struct Script {
    hits: Vec<Query>,
    broken: Vec<Query>,
    disabled: Vec<Query>,
    redirects: Vec<(Query, String)>,
    hang_on_goto: Option<String>,
    page_ready: bool,
    content_present: bool,
    screenshots_fail: bool,
}

impl Script {
    pub fn new() -> Self {
        Self {
            hits: Vec::new(),
            broken: Vec::new(),
            disabled: Vec::new(),
            redirects: Vec::new(),
            hang_on_goto: None,
            page_ready: true,
            content_present: true,
            screenshots_fail: false,
        }
    }

    /// Queries that find an element
    pub fn hit(mut self, query: Query) -> Self {
        self.hits.push(query);
        self
    }

    pub fn hits(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        self.hits.extend(queries);
        self
    }

    /// Queries whose evaluation errors
    pub fn broken(mut self, query: Query) -> Self {
        self.broken.push(query);
        self
    }

    /// Queries that match a visible but disabled element
    pub fn disabled(mut self, query: Query) -> Self {
        self.disabled.push(query);
        self
    }

    /// Clicking or pressing a key on `query` moves the page to `url`
    pub fn redirect(mut self, query: Query, url: &str) -> Self {
        self.redirects.push((query, url.to_string()));
        self
    }

    /// Navigating to a URL containing `fragment` never completes
    pub fn hang_on_goto(mut self, fragment: &str) -> Self {
        self.hang_on_goto = Some(fragment.to_string());
        self
    }

    pub fn page_not_ready(mut self) -> Self {
        self.page_ready = false;
        self
    }

    pub fn no_content(mut self) -> Self {
        self.content_present = false;
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.screenshots_fail = true;
        self
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Shared {
    script: Script,
    calls: Mutex<Vec<Call>>,
    url: Mutex<String>,
    closes: AtomicUsize,
}

impl Shared {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, query: &Query, allow_disabled: bool) -> Result<Option<MockHandle>> {
        let script = &self.script;
        if script.broken.contains(query) {
            return Err(Error::Driver("query evaluation failed".to_string()));
        }
        let disabled = script.disabled.contains(query);
        if disabled && !allow_disabled {
            return Ok(None);
        }
        if disabled || script.hits.contains(query) {
            return Ok(Some(MockHandle {
                query: query.clone(),
            }));
        }
        Ok(None)
    }

    fn follow_redirect(&self, query: &Query) {
        if let Some((_, url)) = self.script.redirects.iter().find(|(q, _)| q == query) {
            *self.url.lock().unwrap() = url.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHandle {
    pub query: Query,
}

#[derive(Debug, Clone)]
pub struct MockDriver {
    shared: Arc<Shared>,
}

impl MockDriver {
    pub fn new(script: Script) -> Self {
        Self {
            shared: Arc::new(Shared {
                script,
                calls: Mutex::new(Vec::new()),
                url: Mutex::new("about:blank".to_string()),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    /// Checkpoint names, in capture order
    pub fn screenshots(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Screenshot(file) => Some(checkpoint_name(&file)),
                _ => None,
            })
            .collect()
    }

    pub fn clicked(&self, query: &Query) -> bool {
        self.calls().contains(&Call::Click(query.clone()))
    }

    pub fn filled_with(&self, query: &Query) -> Option<String> {
        self.calls().into_iter().find_map(|c| match c {
            Call::Fill(q, text) if &q == query => Some(text),
            _ => None,
        })
    }
}

// "receipt-<name>-YYYYmmdd-HHMMSS.png" -> "<name>"
fn checkpoint_name(file: &str) -> String {
    let trimmed = file.strip_prefix("receipt-").unwrap_or(file);
    let cut = trimmed.len().saturating_sub("-20250101-000000.png".len());
    trimmed[..cut].to_string()
}

#[async_trait]
impl PageDriver for MockDriver {
    type Handle = MockHandle;

    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.shared.record(Call::Goto(url.to_string()));
        if let Some(fragment) = &self.shared.script.hang_on_goto {
            if url.contains(fragment.as_str()) {
                futures::future::pending::<()>().await;
            }
        }
        *self.shared.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.shared.url.lock().unwrap().clone())
    }

    async fn find(&self, query: &Query, _timeout: Duration) -> Result<Option<MockHandle>> {
        self.shared.record(Call::Find(query.clone()));
        self.shared.lookup(query, false)
    }

    async fn find_visible(&self, query: &Query, _timeout: Duration) -> Result<Option<MockHandle>> {
        self.shared.record(Call::FindVisible(query.clone()));
        self.shared.lookup(query, true)
    }

    async fn click(&self, handle: &MockHandle) -> Result<()> {
        self.shared.record(Call::Click(handle.query.clone()));
        self.shared.follow_redirect(&handle.query);
        Ok(())
    }

    async fn fill(&self, handle: &MockHandle, text: &str) -> Result<()> {
        self.shared
            .record(Call::Fill(handle.query.clone(), text.to_string()));
        Ok(())
    }

    async fn press(&self, handle: &MockHandle, key: &str) -> Result<()> {
        self.shared
            .record(Call::Press(handle.query.clone(), key.to_string()));
        self.shared.follow_redirect(&handle.query);
        Ok(())
    }

    async fn is_enabled(&self, handle: &MockHandle) -> Result<bool> {
        Ok(!self.shared.script.disabled.contains(&handle.query))
    }

    async fn wait_for_url(&self, fragment: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.shared.url.lock().unwrap().contains(fragment))
    }

    async fn wait_until_ready(&self, _timeout: Duration) -> Result<bool> {
        Ok(self.shared.script.page_ready)
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.shared.script.content_present)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.shared.record(Call::Screenshot(file));
        if self.shared.script.screenshots_fail {
            return Err(Error::Driver("screenshot failed".to_string()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.record(Call::Close);
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out drivers that share one recorded history
pub struct MockLauncher {
    driver: MockDriver,
    fail: bool,
}

impl MockLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            driver: MockDriver::new(script),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            driver: MockDriver::new(Script::new()),
            fail: true,
        }
    }

    /// View of every driver this launcher produced
    pub fn driver(&self) -> &MockDriver {
        &self.driver
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    type Driver = MockDriver;

    async fn launch(&self) -> Result<MockDriver> {
        if self.fail {
            return Err(Error::Driver("Chrome not found".to_string()));
        }
        Ok(self.driver.clone())
    }
}

/// Always answers with the same code
pub struct StaticPrompt(pub String);

#[async_trait]
impl CodePrompt for StaticPrompt {
    async fn request_code(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fails the test path if consulted
pub struct NoPrompt;

#[async_trait]
impl CodePrompt for NoPrompt {
    async fn request_code(&self) -> Result<String> {
        Err(Error::Prompt("manual entry was not expected".to_string()))
    }
}

/// Waits forever, like an operator who never types
#[derive(Clone, Default)]
pub struct PendingPrompt {
    pub called: Arc<AtomicBool>,
}

#[async_trait]
impl CodePrompt for PendingPrompt {
    async fn request_code(&self) -> Result<String> {
        self.called.store(true, Ordering::SeqCst);
        futures::future::pending::<()>().await;
        Ok(String::new())
    }
}
