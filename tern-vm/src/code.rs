// tern-vm - Resolved code objects
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Address-resolved, immutable code.
//!
//! Resolution takes a symbolic instruction stream, assigns every label its
//! instruction-count address on one linear scan, and rewrites the stream
//! into absolute-address [`OpCode`]s inside a [`CodeObject`]. A code object
//! never changes after construction; new code is assembled from existing
//! objects with [`CodeBuilder`], which relocates embedded addresses as it
//! splices.

use std::fmt;

use crate::ir::{InternalError, Ir, Result};
use crate::value::Value;

// ============================================================================
// Line information
// ============================================================================

/// Source position of one instruction, kept in a table parallel to the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo {
    pub line: u32,
    pub column: u32,
}

impl LineInfo {
    pub fn new(line: u32, column: u32) -> LineInfo {
        LineInfo { line, column }
    }
}

// ============================================================================
// Opcodes
// ============================================================================

/// One executable instruction with all addresses resolved.
///
/// Globals keep their source name next to the slot for diagnostics; local
/// and argument slots are plain indices by this point.
#[derive(Debug, Clone, PartialEq)]
pub enum OpCode {
    Push(Value),
    Pop,
    Dup,

    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Not,

    Equal,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    LoadLocal(usize),
    StoreLocal(usize),
    LoadGlobal { slot: usize, name: String },
    StoreGlobal { slot: usize, name: String },
    LoadArgument(usize),

    Jump(usize),
    Branch(usize),
    Call(usize),
    Enter(usize),
    Leave(usize),
    Ret,
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpCode::Push(value) => write!(f, "Push {}", value),
            OpCode::Pop => write!(f, "Pop"),
            OpCode::Dup => write!(f, "Dup"),
            OpCode::Add => write!(f, "Add"),
            OpCode::Sub => write!(f, "Sub"),
            OpCode::Mul => write!(f, "Mul"),
            OpCode::Div => write!(f, "Div"),
            OpCode::Concat => write!(f, "Concat"),
            OpCode::Not => write!(f, "Not"),
            OpCode::Equal => write!(f, "Equal"),
            OpCode::NotEqual => write!(f, "NotEqual"),
            OpCode::Less => write!(f, "Less"),
            OpCode::LessEq => write!(f, "LessEq"),
            OpCode::Greater => write!(f, "Greater"),
            OpCode::GreaterEq => write!(f, "GreaterEq"),
            OpCode::LoadLocal(slot) => write!(f, "LoadLocal {}", slot),
            OpCode::StoreLocal(slot) => write!(f, "StoreLocal {}", slot),
            OpCode::LoadGlobal { slot, name } => write!(f, "LoadGlobal {} ({})", slot, name),
            OpCode::StoreGlobal { slot, name } => write!(f, "StoreGlobal {} ({})", slot, name),
            OpCode::LoadArgument(slot) => write!(f, "LoadArgument {}", slot),
            OpCode::Jump(address) => write!(f, "Jump {}", address),
            OpCode::Branch(address) => write!(f, "Branch {}", address),
            OpCode::Call(argc) => write!(f, "Call {}", argc),
            OpCode::Enter(frame_size) => write!(f, "Enter {}", frame_size),
            OpCode::Leave(param_count) => write!(f, "Leave {}", param_count),
            OpCode::Ret => write!(f, "Ret"),
        }
    }
}

// ============================================================================
// Code objects
// ============================================================================

/// An immutable, fully resolved instruction sequence.
///
/// Carries the frame size the code needs (one past the highest local slot it
/// touches) and the parameter count of the function it belongs to (zero for
/// top-level statement code).
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    code: Vec<OpCode>,
    lines: Vec<LineInfo>,
    frame_size: usize,
    param_count: usize,
}

impl CodeObject {
    fn new(code: Vec<OpCode>, lines: Vec<LineInfo>, param_count: usize) -> CodeObject {
        let frame_size = compute_frame_size(&code);
        CodeObject {
            code,
            lines,
            frame_size,
            param_count,
        }
    }

    pub fn code(&self) -> &[OpCode] {
        &self.code
    }

    pub fn op(&self, address: usize) -> Option<&OpCode> {
        self.code.get(address)
    }

    pub fn line_info(&self, address: usize) -> LineInfo {
        self.lines.get(address).copied().unwrap_or_default()
    }

    /// End address of the code. Execution halts when the pc reaches it.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

/// Address-annotated listing, one instruction per line.
impl fmt::Display for CodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (address, op) in self.code.iter().enumerate() {
            writeln!(f, "{:>4}: {}", address, op)?;
        }
        Ok(())
    }
}

fn compute_frame_size(code: &[OpCode]) -> usize {
    code.iter()
        .filter_map(|op| match op {
            OpCode::LoadLocal(slot) | OpCode::StoreLocal(slot) => Some(slot + 1),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a symbolic stream into a code object.
///
/// The first scan assigns each label the address of the instruction that
/// follows it; the second rewrites jumps and branches to those addresses.
/// Label rows are dropped from the output, so the line table stays parallel.
pub fn resolve(stream: &[(Ir, LineInfo)], param_count: usize) -> Result<CodeObject> {
    let mut address = 0;
    for (ir, _) in stream {
        match ir {
            Ir::Label(label) => label.assign(address)?,
            _ => address += 1,
        }
    }

    let mut code = Vec::with_capacity(address);
    let mut lines = Vec::with_capacity(address);
    for (ir, line) in stream {
        let op = match ir {
            Ir::Label(_) => continue,
            Ir::Push(value) => OpCode::Push(value.clone()),
            Ir::Pop => OpCode::Pop,
            Ir::Dup => OpCode::Dup,
            Ir::Add => OpCode::Add,
            Ir::Sub => OpCode::Sub,
            Ir::Mul => OpCode::Mul,
            Ir::Div => OpCode::Div,
            Ir::Concat => OpCode::Concat,
            Ir::Not => OpCode::Not,
            Ir::Equal => OpCode::Equal,
            Ir::NotEqual => OpCode::NotEqual,
            Ir::Less => OpCode::Less,
            Ir::LessEq => OpCode::LessEq,
            Ir::Greater => OpCode::Greater,
            Ir::GreaterEq => OpCode::GreaterEq,
            Ir::LoadLocal { slot, .. } => OpCode::LoadLocal(*slot),
            Ir::StoreLocal { slot, .. } => OpCode::StoreLocal(*slot),
            Ir::LoadGlobal { slot, name } => OpCode::LoadGlobal {
                slot: *slot,
                name: name.clone(),
            },
            Ir::StoreGlobal { slot, name } => OpCode::StoreGlobal {
                slot: *slot,
                name: name.clone(),
            },
            Ir::LoadArgument { slot, .. } => OpCode::LoadArgument(*slot),
            Ir::Jump(label) => OpCode::Jump(label.address()?),
            Ir::Branch(label) => OpCode::Branch(label.address()?),
            Ir::Call(argc) => OpCode::Call(*argc),
            Ir::Enter(frame_size) => OpCode::Enter(*frame_size),
            Ir::Leave(param_count) => OpCode::Leave(*param_count),
            Ir::Ret => OpCode::Ret,
        };
        code.push(op);
        lines.push(*line);
    }

    Ok(CodeObject::new(code, lines, param_count))
}

// ============================================================================
// Assembly and relocation
// ============================================================================

/// Assembles code objects from resolved pieces.
///
/// Used to splice a compiled function body into its calling-convention
/// prologue and epilogue.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: Vec<OpCode>,
    lines: Vec<LineInfo>,
}

impl CodeBuilder {
    pub fn new() -> CodeBuilder {
        CodeBuilder::default()
    }

    pub fn push(&mut self, op: OpCode, line: LineInfo) {
        self.code.push(op);
        self.lines.push(line);
    }

    /// Append `other`'s instructions at the current end.
    ///
    /// Jump and branch targets shift by the current length, and local slot
    /// references shift by `local_base` so the spliced code can share a
    /// frame with code that already occupies the lower slots.
    pub fn append_relocated(&mut self, other: &CodeObject, local_base: usize) {
        let offset = self.code.len();
        for (address, op) in other.code.iter().enumerate() {
            let relocated = match op {
                OpCode::Jump(target) => OpCode::Jump(target + offset),
                OpCode::Branch(target) => OpCode::Branch(target + offset),
                OpCode::LoadLocal(slot) => OpCode::LoadLocal(slot + local_base),
                OpCode::StoreLocal(slot) => OpCode::StoreLocal(slot + local_base),
                straight => straight.clone(),
            };
            self.code.push(relocated);
            self.lines.push(other.line_info(address));
        }
    }

    pub fn finish(self, param_count: usize) -> CodeObject {
        CodeObject::new(self.code, self.lines, param_count)
    }
}
