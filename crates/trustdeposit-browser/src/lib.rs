//! Chrome backend for the trust deposit session, driven over CDP.

mod chrome_finder;
mod driver;
mod error;
mod launcher;
mod profile;
pub mod query;

pub use chrome_finder::ChromeFinder;
pub use driver::{CdpDriver, CdpLauncher, POLL_INTERVAL};
pub use error::{Error, Result};
pub use launcher::{DESKTOP_USER_AGENT, LaunchOptions};
pub use profile::{ProfileManager, named_profile_path, profiles_dir};
