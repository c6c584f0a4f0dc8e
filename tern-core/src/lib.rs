// tern-core - Types, scopes and the checker for the Tern language
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! # tern-core
//!
//! The semantic layer of the Tern compiler: static types, name bindings
//! and the scope chain, the type checker producing the typed tree, and
//! the constant folder.

pub mod binding;
pub mod check;
pub mod error;
pub mod fold;
pub mod scope;
pub mod typed;
pub mod types;

pub use binding::{Binding, BindingKind};
pub use check::{check_expression, check_unit};
pub use error::{Result, TypeError};
pub use fold::{fold_expr, fold_item, fold_unit};
pub use scope::{Scope, ScopeError};
pub use typed::{BinOp, ExprKind, TypedExpr, TypedFunction, TypedItem};
pub use types::Type;
