//! Error types for pairbench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown predicate kind: {0}")]
    UnknownPredicate(String),

    #[error("Invalid query '{id}': {reason}")]
    InvalidQuery { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
