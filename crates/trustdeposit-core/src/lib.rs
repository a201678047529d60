pub mod checkpoint;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod locator;
pub mod receipt;
pub mod selectors;
pub mod session;
pub mod totp;

#[cfg(test)]
pub(crate) mod testing;

pub use checkpoint::Checkpoints;
pub use credentials::{ConfigSource, Credentials, EnvSource, PortalConfig};
pub use driver::{CodePrompt, Launcher, PageDriver};
pub use error::{Error, Result};
pub use locator::{Interaction, LocatorSpec, Query};
pub use receipt::{MatterTarget, ReceiptFormData};
pub use session::{FillReport, Session, SessionPlan, SessionResult, SessionState, Stage, Timings};
pub use totp::TotpCode;
