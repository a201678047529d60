use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid TOTP secret: {0}")]
    InvalidSecret(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("2FA failed: {0}")]
    TwoFactorFailed(String),

    #[error("Could not find {target} after trying: {}", tried.join(", "))]
    ElementNotFound { target: String, tried: Vec<String> },

    #[error("Failed to submit receipt: {0}")]
    SubmissionFailed(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("2FA prompt error: {0}")]
    Prompt(String),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for lookup misses, which form filling tolerates
    pub fn is_element_not_found(&self) -> bool {
        matches!(self, Error::ElementNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_lists_strategies() {
        let err = Error::ElementNotFound {
            target: "deposit button".to_string(),
            tried: vec!["exact role".to_string(), "text filter".to_string()],
        };

        let message = err.to_string();
        assert!(message.contains("deposit button"));
        assert!(message.contains("exact role, text filter"));
        assert!(err.is_element_not_found());
    }

    #[test]
    fn test_stage_errors_are_not_lookup_misses() {
        assert!(!Error::LoginFailed("bad password".to_string()).is_element_not_found());
        assert!(!Error::Interrupted.is_element_not_found());
    }
}
