use anyhow::{Result, anyhow};
use trustdeposit_core::credentials::{self, TOTP_SECRET_KEY};
use trustdeposit_core::{EnvSource, totp};

/// Print the code the portal currently expects
pub fn execute() -> Result<()> {
    let source = EnvSource::new();
    let secret = credentials::totp_secret(&source)
        .ok_or_else(|| anyhow!("{} is not set", source.var_name(TOTP_SECRET_KEY)))?;

    let code = totp::generate_code(&secret)?;

    println!("🔐 {}", code.code);
    println!("   Valid for {} more seconds", code.seconds_remaining);
    Ok(())
}
