// tern-vm - Symbolic instruction form
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Pre-address instruction form.
//!
//! The translator emits [`Ir`] instructions that reference jump targets
//! through symbolic [`Label`]s instead of absolute addresses. A label is
//! write-once: resolution assigns each label its instruction-count address
//! exactly once, and reading an unassigned label is an error. Slot-addressed
//! instructions carry the source-level name alongside the slot index so that
//! diagnostics can mention what the program called the thing.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

pub type Result<T> = std::result::Result<T, InternalError>;

// ============================================================================
// Errors
// ============================================================================

/// A consistency failure inside the translator or optimizer.
///
/// None of these can be provoked from source text once type checking has
/// passed. Callers treat them as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// Basic-block validation found operand-stack depths that go negative
    /// or disagree between two paths into the same block.
    InvalidStackUse,
    /// A label was assigned an address a second time.
    LabelAssignedTwice(usize),
    /// A label's address was read before resolution assigned it.
    LabelUnassigned(usize),
    /// An instruction or tree node that the checker should have ruled out.
    Unexpected(String),
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalError::InvalidStackUse => write!(f, "invalid stack use"),
            InternalError::LabelAssignedTwice(id) => {
                write!(f, "label L{} assigned twice", id)
            }
            InternalError::LabelUnassigned(id) => {
                write!(f, "label L{} read before assignment", id)
            }
            InternalError::Unexpected(what) => write!(f, "{}", what),
        }
    }
}

impl std::error::Error for InternalError {}

// ============================================================================
// Labels
// ============================================================================

/// A write-once jump target.
///
/// Cloning a label shares the underlying address cell, so every instruction
/// holding a clone observes the address assigned during resolution.
#[derive(Debug, Clone)]
pub struct Label {
    id: usize,
    address: Rc<Cell<Option<usize>>>,
}

impl Label {
    pub fn new(id: usize) -> Label {
        Label {
            id,
            address: Rc::new(Cell::new(None)),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Assign the absolute address. Fails on a second assignment.
    pub fn assign(&self, address: usize) -> Result<()> {
        if self.address.get().is_some() {
            return Err(InternalError::LabelAssignedTwice(self.id));
        }
        self.address.set(Some(address));
        Ok(())
    }

    /// The assigned address. Fails until [`assign`](Label::assign) has run.
    pub fn address(&self) -> Result<usize> {
        self.address
            .get()
            .ok_or(InternalError::LabelUnassigned(self.id))
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Label) -> bool {
        self.id == other.id
    }
}

impl Eq for Label {}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.id)
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// One symbolic instruction.
///
/// `Label` entries mark jump targets in the stream and emit no code; every
/// other variant resolves to exactly one opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Ir {
    /// Pseudo-instruction marking a jump target.
    Label(Label),

    // Stack shuffling
    Push(Value),
    Pop,
    Dup,

    // Arithmetic and logic
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Not,

    // Comparisons
    Equal,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    // Storage access
    LoadLocal { slot: usize, name: String },
    StoreLocal { slot: usize, name: String },
    LoadGlobal { slot: usize, name: String },
    StoreGlobal { slot: usize, name: String },
    LoadArgument { slot: usize, name: String },

    // Control flow
    Jump(Label),
    Branch(Label),
    Call(usize),
    Enter(usize),
    Leave(usize),
    Ret,
}

impl Ir {
    /// Net change this instruction makes to the operand stack depth.
    pub fn stack_delta(&self) -> i64 {
        match self {
            Ir::Label(_) => 0,

            Ir::Push(_) | Ir::Dup => 1,
            Ir::Pop => -1,

            // Binary operators pop two and push one.
            Ir::Add
            | Ir::Sub
            | Ir::Mul
            | Ir::Div
            | Ir::Concat
            | Ir::Equal
            | Ir::NotEqual
            | Ir::Less
            | Ir::LessEq
            | Ir::Greater
            | Ir::GreaterEq => -1,
            Ir::Not => 0,

            Ir::LoadLocal { .. } | Ir::LoadGlobal { .. } | Ir::LoadArgument { .. } => 1,
            Ir::StoreLocal { .. } | Ir::StoreGlobal { .. } => -1,

            Ir::Jump(_) => 0,
            // Pops the condition.
            Ir::Branch(_) => -1,
            // Pops the callee and the arguments, pushes the result.
            Ir::Call(argc) => -(*argc as i64),
            // Enter and Leave move frame data, not operands; Leave re-pushes
            // the return value it pops.
            Ir::Enter(_) | Ir::Leave(_) | Ir::Ret => 0,
        }
    }

    /// True for instructions that end a basic block.
    #[inline]
    pub fn is_terminator(&self) -> bool {
        matches!(self, Ir::Jump(_) | Ir::Branch(_) | Ir::Ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_write_once() {
        let label = Label::new(3);
        assert_eq!(label.address(), Err(InternalError::LabelUnassigned(3)));
        label.assign(17).unwrap();
        assert_eq!(label.address(), Ok(17));
        assert_eq!(label.assign(18), Err(InternalError::LabelAssignedTwice(3)));
        assert_eq!(label.address(), Ok(17));
    }

    #[test]
    fn test_label_clones_share_the_address() {
        let label = Label::new(0);
        let clone = label.clone();
        label.assign(5).unwrap();
        assert_eq!(clone.address(), Ok(5));
    }

    #[test]
    fn test_stack_deltas() {
        assert_eq!(Ir::Push(Value::Int(1)).stack_delta(), 1);
        assert_eq!(Ir::Add.stack_delta(), -1);
        assert_eq!(Ir::Not.stack_delta(), 0);
        assert_eq!(Ir::Branch(Label::new(0)).stack_delta(), -1);
        assert_eq!(Ir::Call(3).stack_delta(), -3);
        assert_eq!(Ir::Call(0).stack_delta(), 0);
        assert_eq!(
            Ir::StoreLocal {
                slot: 0,
                name: "x".to_string()
            }
            .stack_delta(),
            -1
        );
    }

    #[test]
    fn test_terminators() {
        assert!(Ir::Jump(Label::new(0)).is_terminator());
        assert!(Ir::Branch(Label::new(0)).is_terminator());
        assert!(Ir::Ret.is_terminator());
        assert!(!Ir::Call(2).is_terminator());
        assert!(!Ir::Label(Label::new(0)).is_terminator());
    }
}
