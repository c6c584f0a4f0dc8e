// tern-vm - Bytecode translator and virtual machine for the Tern language
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Bytecode translator and stack machine for Tern.
//!
//! This crate takes the checked trees produced by `tern-core` the rest of
//! the way: lowering to a symbolic instruction form, peephole optimization,
//! basic-block stack validation, label resolution into immutable code
//! objects, and finally execution on a stack machine.

pub mod block;
pub mod code;
pub mod ir;
pub mod peephole;
pub mod translate;
pub mod value;
pub mod vm;

pub use block::{split_blocks, validate, Block, Terminator};
pub use code::{resolve, CodeBuilder, CodeObject, LineInfo, OpCode};
pub use ir::{InternalError, Ir, Label};
pub use peephole::optimize;
pub use translate::{translate_function, translate_statement};
pub use value::{native, Function, NativeFn, Value};
pub use vm::{GlobalStore, RuntimeError, MAX_CALL_DEPTH, VM};
