use std::path::PathBuf;

/// Desktop Chrome user agent presented to the portal
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const WINDOW_WIDTH: u32 = 1920;
pub const WINDOW_HEIGHT: u32 = 1080;

/// How to start Chrome for a session
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Explicit Chrome binary; searched for when absent
    pub chrome_path: Option<PathBuf>,
    /// Named persistent profile; a temporary profile when absent
    pub profile: Option<String>,
    pub headless: bool,
}

impl LaunchOptions {
    /// Chrome command-line flags, besides window size and profile directory
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", DESKTOP_USER_AGENT),
        ]
    }
}
