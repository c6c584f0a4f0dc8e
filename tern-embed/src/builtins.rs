// tern-embed - Builtin native functions
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The default native library: console output and Int arrays.
//!
//! Natives receive their arguments as a slice of already-popped values.
//! The checker has verified arity and argument types against the bound
//! signature, so a mismatched argument here is an internal error.

use std::cell::RefCell;
use std::rc::Rc;

use im::Vector;
use tern_core::Type;
use tern_vm::vm::Result as VmResult;
use tern_vm::{native, RuntimeError, Value};

use crate::engine::Engine;
use crate::error::Result;

/// Register the builtin natives on an engine.
pub fn install(engine: &mut Engine) -> Result<()> {
    engine.bind(
        "println",
        Type::function(vec![Type::String], Type::Unit),
        native("println", |args| {
            println!("{}", str_arg(args, 0)?);
            Ok(Value::Unit)
        }),
    )?;

    engine.bind(
        "intArray",
        Type::function(vec![Type::Int, Type::Int], Type::array(Type::Int)),
        native("intArray", |args| {
            let size = int_arg(args, 0)?;
            let fill = int_arg(args, 1)?;
            if size < 0 {
                return Err(RuntimeError::NegativeArraySize(size));
            }
            Ok(Value::array(
                std::iter::repeat(Value::Int(fill)).take(size as usize),
            ))
        }),
    )?;

    engine.bind(
        "arrayGet",
        Type::function(vec![Type::array(Type::Int), Type::Int], Type::Int),
        native("arrayGet", |args| {
            let array = array_arg(args, 0)?;
            let index = int_arg(args, 1)?;
            let elements = array.borrow();
            let at = check_index(index, elements.len())?;
            Ok(elements[at].clone())
        }),
    )?;

    engine.bind(
        "arraySet",
        Type::function(
            vec![Type::array(Type::Int), Type::Int, Type::Int],
            Type::Unit,
        ),
        native("arraySet", |args| {
            let array = array_arg(args, 0)?;
            let index = int_arg(args, 1)?;
            let value = int_arg(args, 2)?;
            let mut elements = array.borrow_mut();
            let at = check_index(index, elements.len())?;
            elements.set(at, Value::Int(value));
            Ok(Value::Unit)
        }),
    )?;

    engine.bind(
        "arrayLength",
        Type::function(vec![Type::array(Type::Int)], Type::Int),
        native("arrayLength", |args| {
            let array = array_arg(args, 0)?;
            let length = array.borrow().len();
            Ok(Value::Int(length as i64))
        }),
    )?;

    Ok(())
}

fn check_index(index: i64, length: usize) -> VmResult<usize> {
    if index < 0 || index as usize >= length {
        return Err(RuntimeError::IndexOutOfBounds { index, length });
    }
    Ok(index as usize)
}

fn int_arg(args: &[Value], index: usize) -> VmResult<i64> {
    args.get(index).and_then(Value::as_int).ok_or_else(|| {
        RuntimeError::Internal(format!("native argument {} is not an Int", index))
    })
}

fn str_arg(args: &[Value], index: usize) -> VmResult<&str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        RuntimeError::Internal(format!("native argument {} is not a String", index))
    })
}

fn array_arg(args: &[Value], index: usize) -> VmResult<&Rc<RefCell<Vector<Value>>>> {
    args.get(index).and_then(Value::as_array).ok_or_else(|| {
        RuntimeError::Internal(format!("native argument {} is not an Array", index))
    })
}
