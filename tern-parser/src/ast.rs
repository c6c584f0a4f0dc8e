// tern-parser - Syntax tree for Tern
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The raw located syntax tree produced by the parser.
//!
//! Nodes carry no type information; the checker in `tern-core` turns this
//! tree into a typed tree of the same shape. Every node records a
//! [`SourceLoc`] used only for diagnostics.

use std::fmt;
use std::rc::Rc;

/// A source position: file, 1-based line and column, and the text of the
/// source line it points into.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLoc {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
    pub text: Rc<str>,
}

impl SourceLoc {
    /// A location for nodes synthesized outside any source text.
    pub fn synthetic() -> Self {
        SourceLoc {
            file: Rc::from("<synthetic>"),
            line: 0,
            column: 0,
            text: Rc::from(""),
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A literal value appearing in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A binary operator as written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    And,
    Or,
    Relational(RelOp),
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Plus => write!(f, "+"),
            BinaryOp::Minus => write!(f, "-"),
            BinaryOp::Multiply => write!(f, "*"),
            BinaryOp::Divide => write!(f, "/"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::Relational(op) => write!(f, "{}", op),
        }
    }
}

/// An expression or statement node.
///
/// Tern treats statements as `Unit`-typed expressions, so a single enum
/// covers both. `Var`, `While` and `Block` never carry a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal.
    Lit { value: Literal, loc: SourceLoc },
    /// A name reference.
    Ref { name: String, loc: SourceLoc },
    /// Boolean negation: `!operand`.
    Not { operand: Box<Expr>, loc: SourceLoc },
    /// A binary operation.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        loc: SourceLoc,
    },
    /// Assignment to an existing binding: `name = value`.
    Assign {
        name: String,
        value: Box<Expr>,
        loc: SourceLoc,
    },
    /// Declaration of a new binding: `var name = value` / `val name = value`.
    Var {
        name: String,
        mutable: bool,
        value: Box<Expr>,
        loc: SourceLoc,
    },
    /// Conditional: `if (cond) then_branch else else_branch`.
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
        loc: SourceLoc,
    },
    /// Loop: `while (cond) body`.
    While {
        cond: Box<Expr>,
        body: Box<Expr>,
        loc: SourceLoc,
    },
    /// A statement list: `{ s1; s2; ... }`. Opens a child scope.
    Block {
        statements: Vec<Expr>,
        loc: SourceLoc,
    },
    /// A parenthesized expression list: `(e1, e2, ...)`. Evaluates left to
    /// right and yields the last element.
    ExprList {
        elements: Vec<Expr>,
        loc: SourceLoc,
    },
    /// A call: `callee(a1, a2, ...)`.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        loc: SourceLoc,
    },
}

impl Expr {
    /// The source location of this node.
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Expr::Lit { loc, .. }
            | Expr::Ref { loc, .. }
            | Expr::Not { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::Assign { loc, .. }
            | Expr::Var { loc, .. }
            | Expr::If { loc, .. }
            | Expr::While { loc, .. }
            | Expr::Block { loc, .. }
            | Expr::ExprList { loc, .. }
            | Expr::Call { loc, .. } => loc,
        }
    }
}

/// Type syntax as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A named type: `Int`, `String`, `Boolean`, `Unit`.
    Name { name: String, loc: SourceLoc },
    /// An array type: `Array<T>`.
    Array {
        element: Box<TypeExpr>,
        loc: SourceLoc,
    },
    /// A function type: `(T1, T2) -> R`.
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        loc: SourceLoc,
    },
}

impl TypeExpr {
    /// The source location of this type expression.
    pub fn loc(&self) -> &SourceLoc {
        match self {
            TypeExpr::Name { loc, .. }
            | TypeExpr::Array { loc, .. }
            | TypeExpr::Function { loc, .. } => loc,
        }
    }
}

/// A function parameter with its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub loc: SourceLoc,
}

/// A top-level function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    /// Declared return type; absent means `Unit`.
    pub return_type: Option<TypeExpr>,
    pub body: Expr,
    pub loc: SourceLoc,
}

/// One top-level item of a compile unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(FunctionDef),
    Statement(Expr),
}
