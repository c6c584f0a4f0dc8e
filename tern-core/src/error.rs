// tern-core - Error types for the Tern checker
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Error type for type checking.

use std::fmt;

use tern_parser::SourceLoc;

/// Result type for checking and folding.
pub type Result<T> = std::result::Result<T, TypeError>;

/// A type-check failure at a source location.
///
/// The first failure aborts the compile unit; there is no recovery or
/// error collection.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub message: String,
    pub location: SourceLoc,
}

impl TypeError {
    pub fn new(message: impl Into<String>, location: &SourceLoc) -> Self {
        TypeError {
            message: message.into(),
            location: location.clone(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type error at {}: {}", self.location, self.message)?;
        if !self.location.text.is_empty() {
            write!(f, "\n  {}", self.location.text)?;
        }
        Ok(())
    }
}

impl std::error::Error for TypeError {}
