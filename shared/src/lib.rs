// shared/src/lib.rs

/// Errors raised by key-value store backends.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connection: {0}")]
    Connection(String),
    #[error("store connection closed")]
    Closed,
    #[error("WRONGTYPE operation against key holding the wrong kind of value: {0}")]
    WrongType(String),
    #[error("value is not an integer or out of range: {0}")]
    NotAnInteger(String),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Expiry in whole seconds, as the store understands it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlSecs(pub u64);

impl Default for TtlSecs {
    fn default() -> Self {
        TtlSecs(300)
    }
}

pub mod config;
