// tern-parser - Lexer and parser for the Tern programming language
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! # tern-parser
//!
//! Lexer and parser for the Tern programming language.
//! Produces the located AST of [`ast`] from source code strings.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{
    BinaryOp, Expr, FunctionDef, Item, Literal, Param, RelOp, SourceLoc, TypeExpr,
};
pub use lexer::{Lexer, LexerError, Token};
pub use parser::{ParseError, Parser};
