pub mod completion;
pub mod profile;
pub mod receipt;
pub mod totp;
