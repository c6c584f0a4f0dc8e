// tern-embed - Error path tests
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Drives every error family through the full pipeline and checks what
//! reaches the host.

use tern_embed::{Engine, Value};

fn evaluate(source: &str) -> Result<Option<Value>, String> {
    let mut engine = Engine::new().map_err(|e| e.to_string())?;
    engine.evaluate_statement(source).map_err(|e| e.to_string())
}

fn expect_error(source: &str, needle: &str) {
    match evaluate(source) {
        Ok(value) => panic!("expected an error evaluating {:?}, got {:?}", source, value),
        Err(text) => assert!(
            text.contains(needle),
            "error {:?} does not contain {:?}",
            text,
            needle
        ),
    }
}

// =============================================================================
// Syntax errors
// =============================================================================

#[test]
fn test_incomplete_expression() {
    expect_error("1 +;", "Parse error at");
}

#[test]
fn test_missing_declaration_name() {
    expect_error("var = 5;", "Parse error at");
}

#[test]
fn test_unterminated_string() {
    expect_error("\"abc", "Parse error at 1:");
}

// =============================================================================
// Type errors
// =============================================================================

#[test]
fn test_mixed_arithmetic() {
    expect_error("1 + true;", "expects Int");
    expect_error("true - 1;", "expects Int");
    expect_error("\"foo\" - \"bar\";", "expects Int");
}

#[test]
fn test_mismatched_comparison() {
    expect_error("true == 1;", "matching operand types");
}

#[test]
fn test_unknown_name() {
    expect_error("y;", "Unable to resolve name 'y'");
}

#[test]
fn test_calling_a_non_function() {
    expect_error("1(2);", "Cannot call a value of type Int");
}

#[test]
fn test_wrong_argument_count() {
    expect_error(
        "fun add(a: Int, b: Int): Int = a + b; add(1);",
        "Wrong number of arguments: expected 2, got 1",
    );
}

#[test]
fn test_assigning_to_a_val() {
    expect_error("val k = 5; k = 6;", "immutable");
}

#[test]
fn test_type_errors_carry_a_position() {
    expect_error("1 + true;", "Type error at");
}

// =============================================================================
// Runtime value errors
// =============================================================================

#[test]
fn test_division_by_zero_is_not_folded_away() {
    // Constant folding keeps the division so the error surfaces at
    // runtime with its source position.
    expect_error("1 / 0;", "Division by zero at 1:3");
}

#[test]
fn test_division_by_a_folded_zero() {
    expect_error("10 / (2 - 2);", "Division by zero");
}

#[test]
fn test_index_out_of_bounds() {
    expect_error(
        "arrayGet(intArray(3, 0), 5);",
        "Index 5 out of bounds for array of length 3",
    );
    expect_error(
        "arrayGet(intArray(3, 0), -1);",
        "Index -1 out of bounds for array of length 3",
    );
    expect_error(
        "arraySet(intArray(2, 0), 2, 1);",
        "Index 2 out of bounds for array of length 2",
    );
}

#[test]
fn test_negative_array_size() {
    expect_error("intArray(-2, 0);", "Negative array size: -2");
}

#[test]
fn test_runaway_recursion() {
    expect_error(
        "fun forever(n: Int): Int = forever(n + 1); forever(0);",
        "Call stack overflow",
    );
}

// =============================================================================
// Abort semantics
// =============================================================================

#[test]
fn test_runtime_errors_keep_executed_effects() {
    let mut engine = Engine::new().unwrap();
    let err = engine
        .evaluate_statement("var x = 1; x = 2; 1 / 0; x = 9;")
        .unwrap_err();
    assert!(err.to_string().contains("Division by zero"), "got: {err}");
    assert_eq!(engine.global("x"), Some(Value::Int(2)));
}

#[test]
fn test_check_errors_run_nothing() {
    let mut engine = Engine::new().unwrap();
    engine.evaluate_statement("var x = 1;").unwrap();
    let err = engine
        .evaluate_statement("x = 2; \"a\" - \"b\";")
        .unwrap_err();
    assert!(err.to_string().contains("expects Int"), "got: {err}");
    // The fragment failed to check, so the assignment never ran.
    assert_eq!(engine.global("x"), Some(Value::Int(1)));
}
