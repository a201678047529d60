//! Login credentials and portal settings, loaded once at startup.
//!
//! Values come from a key/value [`ConfigSource`]. The process environment is
//! read through [`EnvSource`], which namespaces every key with `SMOKEBALL_`.

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use url::Url;

pub const USERNAME_KEY: &str = "USERNAME";
pub const PASSWORD_KEY: &str = "PASSWORD";
pub const TOTP_SECRET_KEY: &str = "TOTP_SECRET";
/// Older deployments name the secret `SMOKEBALL_2FA_SECRET`
pub const TOTP_SECRET_ALIAS: &str = "2FA_SECRET";
pub const BASE_URL_KEY: &str = "BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://app.smokeball.com.au";

/// A read-only source of configuration values
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `SMOKEBALL_<KEY>` from the process environment
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::with_prefix("SMOKEBALL_")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a logical key
    pub fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub totp_secret: Option<SecretString>,
}

impl Credentials {
    /// Load credentials; username and password are mandatory
    pub fn load(source: &impl ConfigSource) -> Result<Self> {
        let username = required(source, USERNAME_KEY)?;
        let password = required(source, PASSWORD_KEY)?;
        let totp_secret = totp_secret(source);

        if totp_secret.is_none() {
            tracing::warn!("No TOTP secret configured; 2FA will require manual input");
        }

        Ok(Self {
            username,
            password: password.into(),
            totp_secret: totp_secret.map(SecretString::from),
        })
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn totp_secret(&self) -> Option<&str> {
        self.totp_secret.as_ref().map(|s| s.expose_secret())
    }

    pub fn has_totp_secret(&self) -> bool {
        self.totp_secret.is_some()
    }
}

/// Where the target application lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub base_url: Url,
}

impl PortalConfig {
    pub fn load(source: &impl ConfigSource) -> Result<Self> {
        let raw = optional(source, BASE_URL_KEY).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw).map_err(|e| {
            Error::Config(format!(
                "{} is not a valid URL ({}): {}",
                BASE_URL_KEY, raw, e
            ))
        })?;

        if base_url.scheme() != "https" && base_url.scheme() != "http" {
            return Err(Error::Config(format!(
                "{} must be an http(s) URL, got {}",
                BASE_URL_KEY, raw
            )));
        }

        Ok(Self { base_url })
    }

    /// Base URL without a trailing slash, for string composition
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// `TOTP_SECRET`, falling back to `2FA_SECRET`
pub fn totp_secret(source: &impl ConfigSource) -> Option<String> {
    optional(source, TOTP_SECRET_KEY).or_else(|| optional(source, TOTP_SECRET_ALIAS))
}

fn required(source: &impl ConfigSource, key: &str) -> Result<String> {
    optional(source, key).ok_or_else(|| Error::Config(format!("{} is not set", key)))
}

fn optional(source: &impl ConfigSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
