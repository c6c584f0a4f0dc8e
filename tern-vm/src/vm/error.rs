// tern-vm - Runtime error types
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Errors raised while the machine is running.
//!
//! Two families share this type. Value errors are conditions the type system
//! cannot rule out, such as dividing by zero; they abort the current
//! evaluation and are reported to the user. The remaining variants are
//! internal errors: they mean translated code did something the checker
//! promises never happens, and callers must treat them as fatal rather than
//! retry.

use std::fmt;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Integer division with a zero divisor, with the source position of
    /// the dividing instruction.
    DivisionByZero { line: u32, column: u32 },
    /// Array access outside the array's bounds.
    IndexOutOfBounds { index: i64, length: usize },
    /// Array allocation with a negative element count.
    NegativeArraySize(i64),
    /// The call stack grew past its limit.
    CallStackOverflow,

    // Internal errors: impossible once type checking has passed.
    StackUnderflow,
    UninitializedSlot(usize),
    UnboundGlobal(String),
    NotCallable(&'static str),
    Internal(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::DivisionByZero { line, column } => {
                write!(f, "Division by zero at {}:{}", line, column)
            }
            RuntimeError::IndexOutOfBounds { index, length } => {
                write!(
                    f,
                    "Index {} out of bounds for array of length {}",
                    index, length
                )
            }
            RuntimeError::NegativeArraySize(count) => {
                write!(f, "Negative array size: {}", count)
            }
            RuntimeError::CallStackOverflow => write!(f, "Call stack overflow"),
            RuntimeError::StackUnderflow => {
                write!(f, "Internal error: operand stack underflow")
            }
            RuntimeError::UninitializedSlot(index) => {
                write!(f, "Internal error: read of uninitialized slot {}", index)
            }
            RuntimeError::UnboundGlobal(name) => {
                write!(f, "Internal error: unbound global '{}'", name)
            }
            RuntimeError::NotCallable(type_name) => {
                write!(f, "Internal error: call to a value of type {}", type_name)
            }
            RuntimeError::Internal(message) => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl RuntimeError {
    /// True for the internal family, which indicates a compiler bug.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            RuntimeError::StackUnderflow
                | RuntimeError::UninitializedSlot(_)
                | RuntimeError::UnboundGlobal(_)
                | RuntimeError::NotCallable(_)
                | RuntimeError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            RuntimeError::DivisionByZero { line: 3, column: 9 }.to_string(),
            "Division by zero at 3:9"
        );
        assert_eq!(
            RuntimeError::IndexOutOfBounds {
                index: 5,
                length: 3
            }
            .to_string(),
            "Index 5 out of bounds for array of length 3"
        );
        assert_eq!(
            RuntimeError::UnboundGlobal("x".to_string()).to_string(),
            "Internal error: unbound global 'x'"
        );
    }

    #[test]
    fn test_error_families() {
        assert!(!RuntimeError::CallStackOverflow.is_internal());
        assert!(!RuntimeError::NegativeArraySize(-1).is_internal());
        assert!(RuntimeError::StackUnderflow.is_internal());
        assert!(RuntimeError::NotCallable("Int").is_internal());
    }
}
