//! Error kinds raised by the codec.
//!
//! Under-run is deliberately NOT one of these: it is reported as a boolean
//! return value, never as an error, so a partial value can still be handed
//! back to the caller.

use thiserror::Error;

/// Problems discovered while building or using a type's [`StructSpec`](crate::directive::StructSpec).
///
/// These are "configuration errors": defects in how a type was annotated,
/// not in the bytes being processed. They are raised eagerly the first time
/// a type's layout is validated and are not meant to be caught and handled by
/// library consumers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("encode error: {0}")]
    Encode(String),
}

impl CodecError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        CodecError::Configuration(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        CodecError::Encode(msg.into())
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
