// tern-vm - Runtime value representation
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Runtime values.
//!
//! Every value the machine can hold on its operand stack or in a store is a
//! [`Value`]. Scalars are stored inline; strings, arrays, and functions are
//! reference-counted so that pushing and duplicating them stays cheap. Arrays
//! are the one mutable reference type: writing through any handle is visible
//! through every other handle to the same array.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::code::CodeObject;
use crate::vm::error::{Result, RuntimeError};

/// Signature shared by all native (host-provided) functions.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A callable value: either translated code or a native host function.
#[derive(Clone)]
pub enum Function {
    /// A function translated from source, ready to run on the machine.
    Code {
        name: Rc<str>,
        code: Rc<CodeObject>,
    },
    /// A host function invoked with its popped arguments.
    Native { name: Rc<str>, f: NativeFn },
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Code { name, .. } | Function::Native { name, .. } => name,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Code { name, .. } => write!(f, "Code({})", name),
            Function::Native { name, .. } => write!(f, "Native({})", name),
        }
    }
}

/// A value produced by evaluation.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Str(Rc<str>),
    Bool(bool),
    Unit,
    Function(Rc<Function>),
    Array(Rc<RefCell<im::Vector<Value>>>),
}

impl Value {
    /// Build a string value from anything string-like.
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Build an array value from a sequence of elements.
    pub fn array(elements: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements.into_iter().collect())))
    }

    /// The name of this value's static type, as written in source.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Str(_) => "String",
            Value::Bool(_) => "Boolean",
            Value::Unit => "Unit",
            Value::Function(_) => "Function",
            Value::Array(_) => "Array",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Rc<RefCell<im::Vector<Value>>>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Text used when a value is appended to a string with `+`.
    ///
    /// Identical to [`Display`](fmt::Display) except that strings contribute
    /// their contents without surrounding quotes.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }

    /// Ordering between two values of the same runtime type, where one exists.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            // Functions and arrays compare by identity, not contents.
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Unit => write!(f, "()"),
            Value::Function(fun) => write!(f, "<fun {}>", fun.name()),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Build a native function value.
pub fn native(name: &str, f: impl Fn(&[Value]) -> Result<Value> + 'static) -> Value {
    Value::Function(Rc::new(Function::Native {
        name: Rc::from(name),
        f: Rc::new(f),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::str("hi").to_string(), "\"hi\"");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Unit.to_string(), "()");
        let arr = Value::array([Value::Int(1), Value::Int(2)]);
        assert_eq!(arr.to_string(), "[1, 2]");
    }

    #[test]
    fn test_concat_text_drops_quotes() {
        assert_eq!(Value::str("hi").to_text(), "hi");
        assert_eq!(Value::Int(7).to_text(), "7");
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::Unit.to_text(), "()");
    }

    #[test]
    fn test_arrays_compare_by_identity() {
        let a = Value::array([Value::Int(1)]);
        let b = Value::array([Value::Int(1)]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_scalar_ordering() {
        assert_eq!(
            Value::Int(1).compare(&Value::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::str("b").compare(&Value::str("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Bool(false).compare(&Value::Bool(true)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int(1).compare(&Value::Bool(true)), None);
    }

    #[test]
    fn test_native_functions_are_callable_values() {
        let f = native("answer", |_| Ok(Value::Int(42)));
        match f {
            Value::Function(fun) => {
                assert_eq!(fun.name(), "answer");
                match &*fun {
                    Function::Native { f, .. } => {
                        assert_eq!(f(&[]).unwrap(), Value::Int(42));
                    }
                    Function::Code { .. } => panic!("expected a native function"),
                }
            }
            other => panic!("expected a function, got {}", other),
        }
    }
}
