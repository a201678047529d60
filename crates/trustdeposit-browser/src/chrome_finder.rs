use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Executable names searched on `PATH` when no install location matches
const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "linux")]
const INSTALL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const INSTALL_PATHS: &[&str] = &[];

/// Locates the Chrome binary the session will drive
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// An explicit path is authoritative; otherwise install locations, then `PATH`.
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(path) = &self.custom_path {
            return check_binary(path);
        }

        let from_install = INSTALL_PATHS.iter().map(PathBuf::from);
        let from_path = PATH_NAMES.iter().filter_map(|name| which::which(name).ok());

        for candidate in from_install.chain(from_path) {
            match check_binary(&candidate) {
                Ok(path) => {
                    tracing::debug!("Using Chrome at {}", path.display());
                    return Ok(path);
                }
                Err(e) => tracing::trace!("Skipping {}: {}", candidate.display(), e),
            }
        }

        Err(Error::Browser(format!(
            "Chrome not found in {} or on PATH. Pass --chrome-path or set TRUSTDEPOSIT_CHROME.",
            INSTALL_PATHS.join(", ")
        )))
    }
}

fn check_binary(path: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| Error::Browser(format!("Chrome not found at: {}", path.display())))?;

    if !metadata.is_file() {
        return Err(Error::Browser(format!("Chrome path is not a file: {}", path.display())));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::Browser(format!(
                "Chrome binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
