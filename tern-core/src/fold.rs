// tern-core - Constant folder for the typed tree
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Bottom-up constant folding over the typed tree.
//!
//! Folds are restricted to operations that cannot fail at runtime, so a
//! folded program keeps the original's failure behavior: `+ - *` wrap
//! exactly like the VM, division is never pre-evaluated (`1 / 0` must
//! still fail when reached), and a rewrite never changes a node's checked
//! type.

use std::cmp::Ordering;

use tern_parser::{Literal, RelOp, SourceLoc};

use crate::typed::{BinOp, ExprKind, TypedExpr, TypedItem};
use crate::types::Type;

/// Fold every item of a checked unit.
pub fn fold_unit(items: Vec<TypedItem>) -> Vec<TypedItem> {
    items.into_iter().map(fold_item).collect()
}

/// Fold a checked item.
pub fn fold_item(item: TypedItem) -> TypedItem {
    match item {
        TypedItem::Function(mut f) => {
            f.body = fold_expr(f.body);
            TypedItem::Function(f)
        }
        TypedItem::Statement(expr) => TypedItem::Statement(fold_expr(expr)),
    }
}

/// Fold a checked expression, children first.
pub fn fold_expr(expr: TypedExpr) -> TypedExpr {
    let TypedExpr { kind, ty, loc } = expr;
    match kind {
        ExprKind::Lit(_) | ExprKind::Ref(_) => TypedExpr { kind, ty, loc },

        ExprKind::Not(operand) => {
            let operand = fold_expr(*operand);
            if let Some(Literal::Bool(b)) = operand.literal() {
                return TypedExpr {
                    kind: ExprKind::Lit(Literal::Bool(!b)),
                    ty,
                    loc,
                };
            }
            TypedExpr {
                kind: ExprKind::Not(Box::new(operand)),
                ty,
                loc,
            }
        }

        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = fold_expr(*lhs);
            let rhs = fold_expr(*rhs);
            if let (Some(a), Some(b)) = (lhs.literal(), rhs.literal()) {
                if let Some(lit) = fold_binary(op, a, b) {
                    return TypedExpr {
                        kind: ExprKind::Lit(lit),
                        ty,
                        loc,
                    };
                }
            }
            TypedExpr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ty,
                loc,
            }
        }

        ExprKind::Assign { binding, value } => TypedExpr {
            kind: ExprKind::Assign {
                binding,
                value: Box::new(fold_expr(*value)),
            },
            ty,
            loc,
        },

        ExprKind::Var { binding, value } => TypedExpr {
            kind: ExprKind::Var {
                binding,
                value: Box::new(fold_expr(*value)),
            },
            ty,
            loc,
        },

        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond = fold_expr(*cond);
            let then_branch = fold_expr(*then_branch);
            let else_branch = else_branch.map(|e| Box::new(fold_expr(*e)));
            if let Some(Literal::Bool(b)) = cond.literal() {
                let taken = if *b {
                    then_branch
                } else {
                    match else_branch {
                        Some(e) => *e,
                        // A taken missing alternative is an empty
                        // statement list.
                        None => TypedExpr {
                            kind: ExprKind::Block(Vec::new()),
                            ty: Type::Unit,
                            loc: loc.clone(),
                        },
                    }
                };
                return keep_type(taken, ty, &loc);
            }
            TypedExpr {
                kind: ExprKind::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch,
                },
                ty,
                loc,
            }
        }

        ExprKind::While { cond, body } => {
            let cond = fold_expr(*cond);
            let body = fold_expr(*body);
            // A loop that can never run folds away; `while (true)` is
            // left alone.
            if cond.literal() == Some(&Literal::Bool(false)) {
                return TypedExpr {
                    kind: ExprKind::Block(Vec::new()),
                    ty,
                    loc,
                };
            }
            TypedExpr {
                kind: ExprKind::While {
                    cond: Box::new(cond),
                    body: Box::new(body),
                },
                ty,
                loc,
            }
        }

        ExprKind::Block(statements) => {
            let mut statements: Vec<TypedExpr> =
                statements.into_iter().map(fold_expr).collect();
            // A single-statement list is the statement itself, provided
            // the unwrap keeps the node's type.
            if statements.len() == 1 && statements[0].ty == ty {
                return statements.remove(0);
            }
            TypedExpr {
                kind: ExprKind::Block(statements),
                ty,
                loc,
            }
        }

        ExprKind::ExprList(elements) => TypedExpr {
            kind: ExprKind::ExprList(elements.into_iter().map(fold_expr).collect()),
            ty,
            loc,
        },

        ExprKind::Call { callee, args } => TypedExpr {
            kind: ExprKind::Call {
                callee: Box::new(fold_expr(*callee)),
                args: args.into_iter().map(fold_expr).collect(),
            },
            ty,
            loc,
        },
    }
}

/// Substitute `taken` for a folded conditional of type `ty`, wrapping it
/// in a statement list when the types differ so the checked type of the
/// node is preserved.
fn keep_type(taken: TypedExpr, ty: Type, loc: &SourceLoc) -> TypedExpr {
    if taken.ty == ty {
        taken
    } else {
        TypedExpr {
            kind: ExprKind::Block(vec![taken]),
            ty,
            loc: loc.clone(),
        }
    }
}

fn fold_binary(op: BinOp, lhs: &Literal, rhs: &Literal) -> Option<Literal> {
    match op {
        BinOp::Add => int_op(lhs, rhs, i64::wrapping_add),
        BinOp::Sub => int_op(lhs, rhs, i64::wrapping_sub),
        BinOp::Mul => int_op(lhs, rhs, i64::wrapping_mul),
        // Division can fail at runtime and is never pre-evaluated.
        BinOp::Div => None,
        BinOp::Concat => match lhs {
            Literal::Str(s) => Some(Literal::Str(format!("{}{}", s, literal_text(rhs)))),
            _ => None,
        },
        BinOp::Rel(rel) => compare(rel, lhs, rhs).map(Literal::Bool),
    }
}

fn int_op(lhs: &Literal, rhs: &Literal, op: fn(i64, i64) -> i64) -> Option<Literal> {
    match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(op(*a, *b))),
        _ => None,
    }
}

/// Runtime text of a literal under string concatenation (no quotes).
fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Int(n) => n.to_string(),
        Literal::Str(s) => s.clone(),
        Literal::Bool(b) => b.to_string(),
    }
}

fn compare(op: RelOp, lhs: &Literal, rhs: &Literal) -> Option<bool> {
    let ord = match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => a.cmp(b),
        (Literal::Str(a), Literal::Str(b)) => a.cmp(b),
        (Literal::Bool(a), Literal::Bool(b)) => a.cmp(b),
        _ => return None,
    };
    Some(match op {
        RelOp::Eq => ord == Ordering::Equal,
        RelOp::Ne => ord != Ordering::Equal,
        RelOp::Lt => ord == Ordering::Less,
        RelOp::Le => ord != Ordering::Greater,
        RelOp::Gt => ord == Ordering::Greater,
        RelOp::Ge => ord != Ordering::Less,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check_expression;
    use crate::scope::Scope;
    use tern_parser::Parser;

    fn folded(source: &str) -> TypedExpr {
        let expr = Parser::parse_expression_str(source).unwrap();
        let typed = check_expression(&expr, &Scope::global()).unwrap();
        fold_expr(typed)
    }

    fn folded_last_statement(source: &str) -> TypedExpr {
        let items = Parser::parse_str(source).unwrap();
        let mut typed = crate::check::check_unit(&items, &Scope::global()).unwrap();
        match typed.pop().unwrap() {
            TypedItem::Statement(e) => fold_expr(e),
            other => panic!("expected a statement, got {:?}", other),
        }
    }

    fn folded_literal(source: &str) -> Literal {
        match folded(source).kind {
            ExprKind::Lit(lit) => lit,
            other => panic!("expected a literal, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_arithmetic_folds() {
        assert_eq!(folded_literal("1 + 1"), Literal::Int(2));
        assert_eq!(folded_literal("3 + 4 * 5"), Literal::Int(23));
        assert_eq!(folded_literal("10 - 2 - 3"), Literal::Int(5));
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(
            folded_literal("9223372036854775807 + 1"),
            Literal::Int(i64::MIN)
        );
    }

    #[test]
    fn test_division_never_folds() {
        assert!(matches!(
            folded("1 / 0").kind,
            ExprKind::Binary { op: BinOp::Div, .. }
        ));
        // Even a division that would succeed is left for the VM.
        assert!(matches!(
            folded("6 / 2").kind,
            ExprKind::Binary { op: BinOp::Div, .. }
        ));
    }

    #[test]
    fn test_concat_folds() {
        assert_eq!(
            folded_literal(r#""foo" + 4 + true"#),
            Literal::Str("foo4true".to_string())
        );
        assert_eq!(
            folded_literal(r#""a" + "b""#),
            Literal::Str("ab".to_string())
        );
    }

    #[test]
    fn test_not_folds() {
        assert_eq!(folded_literal("!true"), Literal::Bool(false));
        assert_eq!(folded_literal("!!false"), Literal::Bool(false));
    }

    #[test]
    fn test_relational_folds() {
        assert_eq!(folded_literal("4 != 4"), Literal::Bool(false));
        assert_eq!(folded_literal("4 <= 5"), Literal::Bool(true));
        assert_eq!(folded_literal(r#""a" == " a""#), Literal::Bool(false));
    }

    #[test]
    fn test_and_or_fold_through_desugar() {
        // The checker rewrites and/or into conditionals; a literal
        // condition then selects the branch.
        assert_eq!(folded_literal("true and false"), Literal::Bool(false));
        assert_eq!(folded_literal("false or true"), Literal::Bool(true));
    }

    #[test]
    fn test_if_with_literal_condition_folds() {
        assert_eq!(folded_literal("if (true) 1 else 2"), Literal::Int(1));
        assert_eq!(folded_literal("if (1 < 2) 7 else 8"), Literal::Int(7));
        assert_eq!(folded_literal("if (false) 1 else 2"), Literal::Int(2));
    }

    #[test]
    fn test_folded_conditional_keeps_checked_type() {
        // Without an alternative the conditional has type Unit; folding
        // must not turn it into an Int.
        let typed = folded("if (true) 1");
        assert_eq!(typed.ty, Type::Unit);
    }

    #[test]
    fn test_while_false_folds_away() {
        let typed = folded_last_statement("var x = 0; while (false) x = 1;");
        assert!(matches!(typed.kind, ExprKind::Block(ref s) if s.is_empty()));
    }

    #[test]
    fn test_while_true_is_left_alone() {
        let typed = folded_last_statement("var x = 0; while (true) x = 1;");
        assert!(matches!(typed.kind, ExprKind::While { .. }));
    }

    #[test]
    fn test_single_statement_block_unwraps() {
        let typed = folded_last_statement("var x = 0; { x = 1; }");
        assert!(matches!(typed.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn test_non_literal_operands_do_not_fold() {
        let scope = Scope::global();
        scope.bind("x", Type::Int, true).unwrap();
        let expr = Parser::parse_expression_str("x + 1").unwrap();
        let typed = check_expression(&expr, &scope).unwrap();
        assert!(matches!(
            fold_expr(typed).kind,
            ExprKind::Binary { op: BinOp::Add, .. }
        ));
    }
}
