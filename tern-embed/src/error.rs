// tern-embed - Engine error type
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The umbrella error for the embedding surface.
//!
//! Each stage of the pipeline keeps its own error type; the engine folds
//! them into one so hosts handle a single family.

use std::fmt;

use tern_core::TypeError;
use tern_parser::ParseError;
use tern_vm::{InternalError, RuntimeError};

pub type Result<T> = std::result::Result<T, Error>;

/// Any error the engine can produce.
#[derive(Debug)]
pub enum Error {
    /// Lexing or parsing rejected the source.
    Parse(ParseError),
    /// The type checker rejected the source.
    Type(TypeError),
    /// The translator hit a broken invariant. This is a compiler bug,
    /// not a user error.
    Internal(InternalError),
    /// Evaluation failed at runtime.
    Runtime(RuntimeError),
    /// The host misused the engine surface.
    Engine(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => e.fmt(f),
            Error::Type(e) => e.fmt(f),
            Error::Internal(e) => write!(f, "Internal error: {}", e),
            Error::Runtime(e) => e.fmt(f),
            Error::Engine(message) => write!(f, "Engine error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Type(e) => Some(e),
            Error::Internal(e) => Some(e),
            Error::Runtime(e) => Some(e),
            Error::Engine(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<TypeError> for Error {
    fn from(e: TypeError) -> Self {
        Error::Type(e)
    }
}

impl From<InternalError> for Error {
    fn from(e: InternalError) -> Self {
        Error::Internal(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Runtime(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_message() {
        let err = Error::from(RuntimeError::CallStackOverflow);
        assert_eq!(err.to_string(), "Call stack overflow");
        let err = Error::from(InternalError::InvalidStackUse);
        assert_eq!(err.to_string(), "Internal error: invalid stack use");
    }

    #[test]
    fn test_engine_errors_are_prefixed() {
        let err = Error::Engine("name 'x' is already bound".to_string());
        assert_eq!(err.to_string(), "Engine error: name 'x' is already bound");
    }
}
