use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Chrome user data directory for one session
#[derive(Debug)]
pub struct ProfileManager {
    path: PathBuf,
    is_temporary: bool,
}

impl ProfileManager {
    /// A throwaway profile, deleted on drop
    pub fn temporary() -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("trustdeposit-profile-")
            .tempdir()?
            .keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    /// Create or reuse a profile at the given path
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    /// A persistent profile under `~/.trustdeposit/profiles/<name>`.
    ///
    /// Keeping the portal's cookies between runs can skip the 2FA step.
    pub fn named(name: &str) -> Result<Self> {
        Self::persistent(named_profile_path(name)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// Root directory for named profiles
pub fn profiles_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".trustdeposit").join("profiles"))
        .ok_or_else(|| Error::Browser("Could not determine home directory".to_string()))
}

/// Path of a named profile; names are single path components
pub fn named_profile_path(name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Browser(format!("Invalid profile name: {:?}", name)));
    }
    Ok(profiles_dir()?.join(name))
}
