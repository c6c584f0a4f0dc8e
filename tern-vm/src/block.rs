// tern-vm - Basic blocks and stack validation
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Basic-block construction and the stack-balance check.
//!
//! Before resolution, the instruction stream is split into basic blocks:
//! maximal straight-line runs ending in a jump, a branch, or an exit from
//! the code. A worklist walk from the entry block then computes the operand
//! stack depth at every block boundary. Two paths reaching the same block
//! with different depths, or any instruction driving the depth negative,
//! mean the translator or optimizer produced garbage, and validation fails
//! with [`InternalError::InvalidStackUse`] before the code can reach the
//! machine. This is the single well-formedness check the backend runs.

use std::collections::HashMap;

use crate::code::LineInfo;
use crate::ir::{InternalError, Ir, Label, Result};

/// A maximal straight-line run of instructions.
///
/// `start..end` are row indices into the stream, label rows included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub end: usize,
    pub terminator: Terminator,
}

/// Where control goes when a block ends. Successors are block indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Execution leaves the code object.
    Exit,
    /// One successor, from an unconditional jump or plain fall-through.
    Jump(usize),
    /// Conditional: taken when the condition is false, else fall through.
    Branch { target: usize, fallthrough: usize },
}

/// Split a stream into basic blocks with resolved successor edges.
pub fn split_blocks(stream: &[(Ir, LineInfo)]) -> Result<Vec<Block>> {
    if stream.is_empty() {
        return Ok(Vec::new());
    }

    // A block starts at row zero, at every label, and after every
    // terminator. Label rows therefore always sit at a block start.
    let mut starts = Vec::new();
    for (row, (op, _)) in stream.iter().enumerate() {
        if row == 0 || matches!(op, Ir::Label(_)) || stream[row - 1].0.is_terminator() {
            starts.push(row);
        }
    }

    let mut label_blocks = HashMap::new();
    for (index, &start) in starts.iter().enumerate() {
        if let (Ir::Label(label), _) = &stream[start] {
            label_blocks.insert(label.id(), index);
        }
    }

    let block_of = |label: &Label| -> Result<usize> {
        label_blocks.get(&label.id()).copied().ok_or_else(|| {
            InternalError::Unexpected(format!("jump to a label missing from the stream: {}", label))
        })
    };

    let mut blocks = Vec::with_capacity(starts.len());
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(stream.len());
        let is_last = index + 1 == starts.len();
        let terminator = match &stream[end - 1].0 {
            Ir::Jump(label) => Terminator::Jump(block_of(label)?),
            Ir::Branch(label) => {
                if is_last {
                    return Err(InternalError::Unexpected(
                        "branch falls off the end of the code".to_string(),
                    ));
                }
                Terminator::Branch {
                    target: block_of(label)?,
                    fallthrough: index + 1,
                }
            }
            Ir::Ret => Terminator::Exit,
            _ if is_last => Terminator::Exit,
            _ => Terminator::Jump(index + 1),
        };
        blocks.push(Block {
            start,
            end,
            terminator,
        });
    }
    Ok(blocks)
}

/// Check that operand-stack depths are consistent across the block graph.
pub fn validate(stream: &[(Ir, LineInfo)]) -> Result<()> {
    let blocks = split_blocks(stream)?;
    if blocks.is_empty() {
        return Ok(());
    }

    let mut entry_depth: Vec<Option<i64>> = vec![None; blocks.len()];
    let mut work = vec![(0usize, 0i64)];
    while let Some((index, at_entry)) = work.pop() {
        match entry_depth[index] {
            Some(seen) if seen == at_entry => continue,
            Some(_) => return Err(InternalError::InvalidStackUse),
            None => entry_depth[index] = Some(at_entry),
        }

        let mut depth = at_entry;
        for (op, _) in &stream[blocks[index].start..blocks[index].end] {
            depth += op.stack_delta();
            if depth < 0 {
                return Err(InternalError::InvalidStackUse);
            }
        }

        match blocks[index].terminator {
            Terminator::Exit => {}
            Terminator::Jump(next) => work.push((next, depth)),
            Terminator::Branch {
                target,
                fallthrough,
            } => {
                work.push((target, depth));
                work.push((fallthrough, depth));
            }
        }
    }
    Ok(())
}
