//! Named Chrome profiles kept between runs.
//!
//! A profile holds the portal's cookies, so a recent login may skip the 2FA
//! step on the next run.
//!
//! ```bash
//! trustdeposit profile list
//! trustdeposit profile delete smokeball
//! ```

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use trustdeposit_browser::{named_profile_path, profiles_dir};

struct ProfileEntry {
    name: String,
    size: u64,
    last_used: Option<DateTime<Local>>,
}

/// List all named profiles
pub fn list() -> Result<()> {
    let dir = profiles_dir()?;

    if !dir.exists() {
        println!(
            "No profiles found. Profiles will be created in: {}",
            dir.display()
        );
        return Ok(());
    }

    let mut profiles = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("Invalid profile name"))?
                .to_string();
            profiles.push(ProfileEntry {
                name,
                size: dir_size(&path).unwrap_or(0),
                last_used: last_used(&path),
            });
        }
    }

    if profiles.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    profiles.sort_by(|a, b| a.name.cmp(&b.name));

    println!("Available profiles in {}:", dir.display());
    println!();
    for profile in profiles {
        let last_used = profile
            .last_used
            .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {:<20} {:>8.1} MB   last used {}",
            profile.name,
            profile.size as f64 / 1_048_576.0,
            last_used
        );
    }

    Ok(())
}

/// Delete a named profile, asking for confirmation unless `force`
pub fn delete(name: &str, force: bool) -> Result<()> {
    let path = named_profile_path(name).map_err(|_| anyhow!("Profile '{}' not found", name))?;

    if !path.is_dir() {
        return Err(anyhow!("Profile '{}' not found", name));
    }

    if !force {
        print!(
            "⚠️  This will permanently delete profile '{}' and its saved login.\nType '{}' to confirm: ",
            name, name
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim() != name {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    fs::remove_dir_all(&path)?;
    println!("✅ Profile '{}' deleted", name);

    Ok(())
}

/// Chrome rewrites `Local State` on every launch
fn last_used(profile: &Path) -> Option<DateTime<Local>> {
    let marker = profile.join("Local State");
    let modified = fs::metadata(&marker)
        .or_else(|_| fs::metadata(profile))
        .and_then(|m| m.modified())
        .ok()?;
    Some(DateTime::<Local>::from(modified))
}

fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}
