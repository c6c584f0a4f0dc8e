// tern-core - Type checker integration tests
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Integration tests for checking whole compile units: scoping across
//! blocks, function definitions, and the operator rules.

use tern_core::{check_unit, BindingKind, Scope, Type, TypedItem};
use tern_parser::Parser;

fn check_str(source: &str) -> Result<Vec<TypedItem>, String> {
    let items = Parser::parse_str(source).map_err(|e| e.to_string())?;
    check_unit(&items, &Scope::global()).map_err(|e| e.to_string())
}

fn check_err(source: &str) -> String {
    match check_str(source) {
        Ok(_) => panic!("expected '{}' to fail the checker", source),
        Err(message) => message,
    }
}

// =============================================================================
// Operator rules
// =============================================================================

#[test]
fn test_arithmetic_operand_errors() {
    assert!(check_err("1 + true;").contains("expects Int"));
    assert!(check_err("true - 1;").contains("expects Int"));
    assert!(check_err(r#""foo" - "bar";"#).contains("expects Int"));
}

#[test]
fn test_relational_operand_errors() {
    assert!(check_err("true == 1;").contains("matching operand types"));
    assert!(check_err("() == ();").contains("does not support"));
}

#[test]
fn test_concatenation_is_left_biased() {
    assert!(check_str(r#""foo" + 42;"#).is_ok());
    assert!(check_str(r#"42 + "foo";"#).is_err());
}

// =============================================================================
// Declarations and scoping
// =============================================================================

#[test]
fn test_top_level_declarations_are_globals() {
    let typed = check_str("var a = 1; val b = true;").unwrap();
    match &typed[0] {
        TypedItem::Statement(s) => match &s.kind {
            tern_core::ExprKind::Var { binding, .. } => {
                assert_eq!(binding.kind, BindingKind::Global);
                assert_eq!(binding.slot, 0);
                assert!(binding.mutable);
            }
            other => panic!("expected a declaration, got {:?}", other),
        },
        other => panic!("expected a statement, got {:?}", other),
    }
    match &typed[1] {
        TypedItem::Statement(s) => match &s.kind {
            tern_core::ExprKind::Var { binding, .. } => {
                assert_eq!(binding.slot, 1);
                assert!(!binding.mutable);
                assert_eq!(binding.ty, Type::Boolean);
            }
            other => panic!("expected a declaration, got {:?}", other),
        },
        other => panic!("expected a statement, got {:?}", other),
    }
}

#[test]
fn test_rebinding_in_same_scope_fails() {
    assert!(check_err("var x = 5; var x = 6;").contains("already bound"));
}

#[test]
fn test_shadowing_in_block() {
    // The inner x is a new Boolean binding; the outer Int x is restored
    // after the block.
    assert!(check_str("var x = 5; { var x = true; x = false; } x = 6;").is_ok());
}

#[test]
fn test_block_locals_are_invisible_after_the_block() {
    assert!(check_err("{ var t = 1; } t = 2;").contains("Unable to resolve"));
}

#[test]
fn test_val_is_immutable() {
    assert!(check_err("val x = 5; x = 6;").contains("immutable"));
}

#[test]
fn test_assignment_requires_matching_type() {
    assert!(check_err("var x = 5; x = true;").contains("Cannot assign"));
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_function_bindings() {
    let typed = check_str("fun inc(n: Int): Int = n + 1;").unwrap();
    match &typed[0] {
        TypedItem::Function(f) => {
            assert_eq!(f.binding.kind, BindingKind::Global);
            assert_eq!(
                f.binding.ty,
                Type::function(vec![Type::Int], Type::Int)
            );
            assert!(!f.binding.mutable);
            assert_eq!(f.params.len(), 1);
            assert_eq!(f.params[0].kind, BindingKind::Argument);
            assert_eq!(f.params[0].slot, 0);
        }
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn test_recursion_resolves() {
    let source = "fun fib(n: Int): Int = if (n < 2) n else fib(n - 1) + fib(n - 2);";
    assert!(check_str(source).is_ok());
}

#[test]
fn test_return_type_mismatch() {
    assert!(check_err("fun f(): Int = true;").contains("return type"));
    // A block body has type Unit.
    assert!(check_err("fun f(): Int { 42; }").contains("return type"));
}

#[test]
fn test_unit_function_accepts_any_body() {
    assert!(check_str("fun f() = 42;").is_ok());
    assert!(check_str("fun f() { var t = 1; t = t + 1; }").is_ok());
}

#[test]
fn test_parameters_are_immutable() {
    assert!(check_err("fun f(a: Int) { a = 2; }").contains("immutable"));
}

#[test]
fn test_duplicate_parameters_fail() {
    assert!(check_err("fun f(a: Int, a: Int) { }").contains("already bound"));
}

#[test]
fn test_function_rebinding_fails() {
    assert!(check_err("fun f() { } fun f() { }").contains("already bound"));
}

#[test]
fn test_calls_resolve_in_order() {
    // Items are checked in order, so a call before the definition does
    // not resolve.
    assert!(check_err("f(); fun f() { }").contains("Unable to resolve"));
    assert!(check_str("fun f() { } f();").is_ok());
}

#[test]
fn test_call_arity_and_types() {
    assert!(check_err("fun add(a: Int, b: Int): Int = a + b; add(1);")
        .contains("Wrong number of arguments: expected 2, got 1"));
    assert!(check_err("fun add(a: Int, b: Int): Int = a + b; add(1, true);")
        .contains("argument 2"));
}

#[test]
fn test_function_locals_count_from_zero() {
    let typed = check_str("fun f(a: Int) { var x = a; x = x + 1; }").unwrap();
    match &typed[0] {
        TypedItem::Function(f) => match &f.body.kind {
            tern_core::ExprKind::Block(statements) => match &statements[0].kind {
                tern_core::ExprKind::Var { binding, .. } => {
                    assert_eq!(binding.kind, BindingKind::Local);
                    assert_eq!(binding.slot, 0);
                }
                other => panic!("expected a declaration, got {:?}", other),
            },
            other => panic!("expected a block body, got {:?}", other),
        },
        other => panic!("expected a function, got {:?}", other),
    }
}

// =============================================================================
// Type syntax
// =============================================================================

#[test]
fn test_unknown_type_name() {
    assert!(check_err("fun f(a: Whatever) { }").contains("Unknown type"));
}

#[test]
fn test_array_and_function_type_syntax() {
    let scope = Scope::global();
    scope
        .bind(
            "arrayGet",
            Type::function(vec![Type::array(Type::Int), Type::Int], Type::Int),
            false,
        )
        .unwrap();
    let items =
        Parser::parse_str("fun first(a: Array<Int>): Int = arrayGet(a, 0);").unwrap();
    assert!(check_unit(&items, &scope).is_ok());

    let items =
        Parser::parse_str("fun apply(f: (Int) -> Int, x: Int): Int = f(x);").unwrap();
    assert!(check_unit(&items, &scope).is_ok());
}

// =============================================================================
// Conditions
// =============================================================================

#[test]
fn test_conditions_must_be_boolean() {
    assert!(check_err("if (1) 2;").contains("must be Boolean"));
    assert!(check_err("while (1) { }").contains("must be Boolean"));
}
