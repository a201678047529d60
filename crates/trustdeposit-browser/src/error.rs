use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

impl From<Error> for trustdeposit_core::Error {
    fn from(err: Error) -> Self {
        trustdeposit_core::Error::Driver(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_driver_error() {
        let core: trustdeposit_core::Error = Error::Browser("Chrome not found".to_string()).into();

        assert!(matches!(core, trustdeposit_core::Error::Driver(_)));
        assert_eq!(core.to_string(), "Browser driver error: Browser error: Chrome not found");
    }
}
