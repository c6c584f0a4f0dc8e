// tern-core - Typed tree produced by the checker
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The typed tree produced by the checker.
//!
//! Same shape as the raw AST, but every node carries its resolved [`Type`]
//! and every name reference carries its resolved [`Binding`]. `and`/`or`
//! do not appear here; the checker rewrites them into short-circuit
//! conditionals.

use std::fmt;
use std::rc::Rc;

use tern_parser::{Literal, RelOp, SourceLoc};

use crate::binding::Binding;
use crate::types::Type;

/// A binary operator in the typed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// String concatenation; the right operand is stringified at runtime.
    Concat,
    Rel(RelOp),
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add | BinOp::Concat => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Rel(op) => write!(f, "{}", op),
        }
    }
}

/// A typed expression or statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: ExprKind,
    pub ty: Type,
    pub loc: SourceLoc,
}

/// The node kinds of the typed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Lit(Literal),
    Ref(Rc<Binding>),
    Not(Box<TypedExpr>),
    Binary {
        op: BinOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Assign {
        binding: Rc<Binding>,
        value: Box<TypedExpr>,
    },
    Var {
        binding: Rc<Binding>,
        value: Box<TypedExpr>,
    },
    If {
        cond: Box<TypedExpr>,
        then_branch: Box<TypedExpr>,
        else_branch: Option<Box<TypedExpr>>,
    },
    While {
        cond: Box<TypedExpr>,
        body: Box<TypedExpr>,
    },
    Block(Vec<TypedExpr>),
    ExprList(Vec<TypedExpr>),
    Call {
        callee: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
}

impl TypedExpr {
    /// Whether this node is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Lit(_))
    }

    /// The literal carried by this node, when it is one.
    pub fn literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Lit(lit) => Some(lit),
            _ => None,
        }
    }
}

/// A checked top-level function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedFunction {
    /// The function's own global binding, bound before the body is
    /// checked so recursive calls resolve.
    pub binding: Rc<Binding>,
    pub params: Vec<Rc<Binding>>,
    pub return_type: Type,
    pub body: TypedExpr,
    pub loc: SourceLoc,
}

/// A checked top-level item.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedItem {
    Function(TypedFunction),
    Statement(TypedExpr),
}
