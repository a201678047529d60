use crate::driver::PageDriver;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub const DEFAULT_SCREENSHOT_DIR: &str = "screenshots";

/// Named diagnostic screenshots, one per checkpoint
#[derive(Debug, Clone)]
pub struct Checkpoints {
    dir: PathBuf,
}

impl Checkpoints {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `receipt-<name>-<YYYYmmdd-HHMMSS>.png` inside the output directory
    pub fn path_for(&self, name: &str, at: DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("receipt-{}-{}.png", name, at.format("%Y%m%d-%H%M%S")))
    }

    /// Take a screenshot. Failures are reported and swallowed.
    pub async fn capture<D>(&self, driver: &D, name: &str) -> Option<PathBuf>
    where
        D: PageDriver + ?Sized,
    {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!("Cannot create screenshot directory {}: {}", self.dir.display(), e);
            return None;
        }

        let path = self.path_for(name, Local::now());
        match driver.screenshot(&path).await {
            Ok(()) => {
                println!("📸 Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                println!("⚠️ Failed to take screenshot: {}", e);
                None
            }
        }
    }
}

impl Default for Checkpoints {
    fn default() -> Self {
        Self::new(DEFAULT_SCREENSHOT_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDriver, Script};
    use chrono::TimeZone;

    #[test]
    fn test_file_name_format() {
        let checkpoints = Checkpoints::new("/tmp/shots");
        let at = Local.with_ymd_and_hms(2025, 11, 21, 9, 5, 7).unwrap();

        let path = checkpoints.path_for("login-page", at);
        assert_eq!(path, PathBuf::from("/tmp/shots/receipt-login-page-20251121-090507.png"));
    }

    #[tokio::test]
    async fn test_capture_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("shots");
        let checkpoints = Checkpoints::new(&dir);
        let driver = MockDriver::new(Script::new());

        let path = checkpoints.capture(&driver, "form-filled").await.unwrap();

        assert!(dir.is_dir());
        assert!(path.starts_with(&dir));
        assert_eq!(driver.screenshots(), vec!["form-filled".to_string()]);
    }

    #[tokio::test]
    async fn test_capture_failure_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let checkpoints = Checkpoints::new(temp.path());
        let driver = MockDriver::new(Script::new().failing_screenshots());

        assert!(checkpoints.capture(&driver, "after-submit").await.is_none());
    }
}
