//! Error types for Taskflow
//!
//! Only internal plumbing (config, token storage, token decoding) returns
//! these. Session and API operations report failures through
//! [`crate::api::ApiResponse`] or a plain `bool`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid token: {0}")]
    Token(String),

    #[error("Config file not found. Run 'taskflow init' first.")]
    ConfigNotFound,
}

pub type Result<T> = std::result::Result<T, Error>;
