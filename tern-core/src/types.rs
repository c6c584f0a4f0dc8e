// tern-core - Static types for the Tern language
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Static types with structural equality.

use std::fmt;
use std::rc::Rc;

use tern_parser::RelOp;

/// A static Tern type.
///
/// Equality is structural: two function types with equal parameter and
/// return types are the same type.
///
/// # Examples
///
/// ```
/// use tern_core::Type;
///
/// let f = Type::function(vec![Type::Int, Type::Int], Type::Int);
/// assert_eq!(f.to_string(), "(Int, Int) -> Int");
/// assert_eq!(Type::array(Type::Int).to_string(), "Array<Int>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    String,
    Boolean,
    Unit,
    /// A function with fixed parameter types and a return type.
    Function { params: Rc<[Type]>, ret: Rc<Type> },
    /// A mutable array with a fixed element type.
    Array(Rc<Type>),
}

impl Type {
    /// Build a function type.
    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function {
            params: params.into(),
            ret: Rc::new(ret),
        }
    }

    /// Build an array type.
    pub fn array(element: Type) -> Type {
        Type::Array(Rc::new(element))
    }

    /// Whether values of this type support the given relational operator.
    ///
    /// `Unit` and function types support none; arrays support only
    /// equality and inequality (by reference identity); the remaining
    /// types support all six.
    pub fn supports_relational(&self, op: RelOp) -> bool {
        match self {
            Type::Unit | Type::Function { .. } => false,
            Type::Array(_) => matches!(op, RelOp::Eq | RelOp::Ne),
            Type::Int | Type::String | Type::Boolean => true,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::String => write!(f, "String"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Unit => write!(f, "Unit"),
            Type::Function { params, ret } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Array(element) => write!(f, "Array<{}>", element),
        }
    }
}
