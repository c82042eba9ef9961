//! Error types shared across the library.

use std::path::PathBuf;

/// Errors raised by the portal services.
///
/// Store primitives never raise; these surface at the portal boundary where
/// validation, authorization and lookups happen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON under key '{key}': {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{actor} is not allowed to {action} {target}")]
    Forbidden {
        actor: String,
        action: &'static str,
        target: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not logged in")]
    NotLoggedIn,
}

/// Login failures. Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Office email and password are required.")]
    MissingCredentials,
    #[error("Invalid email or password")]
    InvalidCredentials,
}

/// Error parsing one of the field enums from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

pub type Result<T> = std::result::Result<T, Error>;
