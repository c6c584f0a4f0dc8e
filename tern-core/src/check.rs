// tern-core - Type checker for the Tern language
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The type checker.
//!
//! Consumes the raw AST and a scope, produces the typed tree: the same
//! shape with a resolved [`Type`] on every node and a resolved
//! [`crate::Binding`] on every name reference. The first error aborts the
//! unit. `and`/`or` are rewritten here into short-circuit conditionals,
//! and `+` on a `String` left operand becomes string concatenation.

use std::rc::Rc;

use tern_parser::{BinaryOp, Expr, FunctionDef, Item, Literal, SourceLoc, TypeExpr};

use crate::binding::Binding;
use crate::error::{Result, TypeError};
use crate::scope::Scope;
use crate::typed::{BinOp, ExprKind, TypedExpr, TypedFunction, TypedItem};
use crate::types::Type;

/// Check a compile unit (a sequence of top-level items) against a scope.
///
/// The scope should be the global scope: top-level declarations bind
/// global slots, and function definitions bind their names before their
/// bodies are checked so recursive calls resolve.
pub fn check_unit(items: &[Item], scope: &Scope) -> Result<Vec<TypedItem>> {
    items
        .iter()
        .map(|item| match item {
            Item::Function(def) => Ok(TypedItem::Function(check_function(def, scope)?)),
            Item::Statement(expr) => Ok(TypedItem::Statement(check_expression(expr, scope)?)),
        })
        .collect()
}

/// Check a single expression against a scope.
pub fn check_expression(expr: &Expr, scope: &Scope) -> Result<TypedExpr> {
    match expr {
        Expr::Lit { value, loc } => Ok(TypedExpr {
            ty: literal_type(value),
            kind: ExprKind::Lit(value.clone()),
            loc: loc.clone(),
        }),

        Expr::Ref { name, loc } => {
            let binding = resolve(name, scope, loc)?;
            Ok(TypedExpr {
                ty: binding.ty.clone(),
                kind: ExprKind::Ref(binding),
                loc: loc.clone(),
            })
        }

        Expr::Not { operand, loc } => {
            let operand = check_expression(operand, scope)?;
            if operand.ty != Type::Boolean {
                return Err(TypeError::new(
                    format!("Operator '!' expects Boolean, got {}", operand.ty),
                    loc,
                ));
            }
            Ok(TypedExpr {
                kind: ExprKind::Not(Box::new(operand)),
                ty: Type::Boolean,
                loc: loc.clone(),
            })
        }

        Expr::Binary { op, lhs, rhs, loc } => check_binary(*op, lhs, rhs, loc, scope),

        Expr::Assign { name, value, loc } => {
            let binding = resolve(name, scope, loc)?;
            if !binding.mutable {
                return Err(TypeError::new(
                    format!("Cannot assign to immutable '{}'", name),
                    loc,
                ));
            }
            let value = check_expression(value, scope)?;
            if value.ty != binding.ty {
                return Err(TypeError::new(
                    format!(
                        "Cannot assign {} to '{}' of type {}",
                        value.ty, name, binding.ty
                    ),
                    loc,
                ));
            }
            Ok(TypedExpr {
                kind: ExprKind::Assign {
                    binding,
                    value: Box::new(value),
                },
                ty: Type::Unit,
                loc: loc.clone(),
            })
        }

        Expr::Var {
            name,
            mutable,
            value,
            loc,
        } => {
            let value = check_expression(value, scope)?;
            let binding = scope
                .bind(name, value.ty.clone(), *mutable)
                .map_err(|e| TypeError::new(e.to_string(), loc))?;
            Ok(TypedExpr {
                kind: ExprKind::Var {
                    binding,
                    value: Box::new(value),
                },
                ty: Type::Unit,
                loc: loc.clone(),
            })
        }

        Expr::If {
            cond,
            then_branch,
            else_branch,
            loc,
        } => {
            let cond = check_condition(cond, "if", scope)?;
            let then_branch = check_expression(then_branch, scope)?;
            let else_branch = match else_branch {
                Some(e) => Some(Box::new(check_expression(e, scope)?)),
                None => None,
            };
            // The conditional has a value only when both branches exist
            // and agree on a type.
            let ty = match &else_branch {
                Some(e) if e.ty == then_branch.ty => then_branch.ty.clone(),
                _ => Type::Unit,
            };
            Ok(TypedExpr {
                kind: ExprKind::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch,
                },
                ty,
                loc: loc.clone(),
            })
        }

        Expr::While { cond, body, loc } => {
            let cond = check_condition(cond, "while", scope)?;
            let body = check_expression(body, scope)?;
            Ok(TypedExpr {
                kind: ExprKind::While {
                    cond: Box::new(cond),
                    body: Box::new(body),
                },
                ty: Type::Unit,
                loc: loc.clone(),
            })
        }

        Expr::Block { statements, loc } => {
            // A top-level block establishes the unit's frame; nested
            // blocks share the enclosing frame's slot counter.
            let child = if scope.is_global() {
                scope
                    .child_frame(&[])
                    .map_err(|e| TypeError::new(e.to_string(), loc))?
            } else {
                scope.child_block()
            };
            let statements = statements
                .iter()
                .map(|s| check_expression(s, &child))
                .collect::<Result<Vec<_>>>()?;
            Ok(TypedExpr {
                kind: ExprKind::Block(statements),
                ty: Type::Unit,
                loc: loc.clone(),
            })
        }

        Expr::ExprList { elements, loc } => {
            let elements = elements
                .iter()
                .map(|e| check_expression(e, scope))
                .collect::<Result<Vec<_>>>()?;
            let ty = elements.last().map_or(Type::Unit, |e| e.ty.clone());
            Ok(TypedExpr {
                kind: ExprKind::ExprList(elements),
                ty,
                loc: loc.clone(),
            })
        }

        Expr::Call { callee, args, loc } => {
            let callee = check_expression(callee, scope)?;
            let (params, ret) = match &callee.ty {
                Type::Function { params, ret } => (Rc::clone(params), Rc::clone(ret)),
                other => {
                    return Err(TypeError::new(
                        format!("Cannot call a value of type {}", other),
                        loc,
                    ));
                }
            };
            if args.len() != params.len() {
                return Err(TypeError::new(
                    format!(
                        "Wrong number of arguments: expected {}, got {}",
                        params.len(),
                        args.len()
                    ),
                    loc,
                ));
            }
            let mut checked = Vec::with_capacity(args.len());
            for (i, (arg, param)) in args.iter().zip(params.iter()).enumerate() {
                let arg = check_expression(arg, scope)?;
                if arg.ty != *param {
                    return Err(TypeError::new(
                        format!(
                            "Type mismatch in argument {}: expected {}, got {}",
                            i + 1,
                            param,
                            arg.ty
                        ),
                        &arg.loc,
                    ));
                }
                checked.push(arg);
            }
            Ok(TypedExpr {
                kind: ExprKind::Call {
                    callee: Box::new(callee),
                    args: checked,
                },
                ty: (*ret).clone(),
                loc: loc.clone(),
            })
        }
    }
}

fn check_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    loc: &SourceLoc,
    scope: &Scope,
) -> Result<TypedExpr> {
    let lhs = check_expression(lhs, scope)?;
    let rhs = check_expression(rhs, scope)?;
    match op {
        BinaryOp::Plus if lhs.ty == Type::String => {
            // String concatenation; the right operand may be any type and
            // is stringified at runtime.
            Ok(TypedExpr {
                kind: ExprKind::Binary {
                    op: BinOp::Concat,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ty: Type::String,
                loc: loc.clone(),
            })
        }
        BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide => {
            for operand in [&lhs, &rhs] {
                if operand.ty != Type::Int {
                    return Err(TypeError::new(
                        format!("Operator '{}' expects Int operands, got {}", op, operand.ty),
                        loc,
                    ));
                }
            }
            let typed_op = match op {
                BinaryOp::Plus => BinOp::Add,
                BinaryOp::Minus => BinOp::Sub,
                BinaryOp::Multiply => BinOp::Mul,
                _ => BinOp::Div,
            };
            Ok(TypedExpr {
                kind: ExprKind::Binary {
                    op: typed_op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ty: Type::Int,
                loc: loc.clone(),
            })
        }
        BinaryOp::And | BinaryOp::Or => {
            for operand in [&lhs, &rhs] {
                if operand.ty != Type::Boolean {
                    return Err(TypeError::new(
                        format!(
                            "Operator '{}' expects Boolean operands, got {}",
                            op, operand.ty
                        ),
                        loc,
                    ));
                }
            }
            // Rewrite into a short-circuit conditional:
            //   a and b  =>  if (a) b else false
            //   a or b   =>  if (a) true else b
            let lit = |value: bool| TypedExpr {
                kind: ExprKind::Lit(Literal::Bool(value)),
                ty: Type::Boolean,
                loc: loc.clone(),
            };
            let (then_branch, else_branch) = match op {
                BinaryOp::And => (rhs, lit(false)),
                _ => (lit(true), rhs),
            };
            Ok(TypedExpr {
                kind: ExprKind::If {
                    cond: Box::new(lhs),
                    then_branch: Box::new(then_branch),
                    else_branch: Some(Box::new(else_branch)),
                },
                ty: Type::Boolean,
                loc: loc.clone(),
            })
        }
        BinaryOp::Relational(rel) => {
            if lhs.ty != rhs.ty {
                return Err(TypeError::new(
                    format!(
                        "Operator '{}' expects matching operand types, got {} and {}",
                        op, lhs.ty, rhs.ty
                    ),
                    loc,
                ));
            }
            if !lhs.ty.supports_relational(rel) {
                return Err(TypeError::new(
                    format!("Type {} does not support operator '{}'", lhs.ty, op),
                    loc,
                ));
            }
            Ok(TypedExpr {
                kind: ExprKind::Binary {
                    op: BinOp::Rel(rel),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                ty: Type::Boolean,
                loc: loc.clone(),
            })
        }
    }
}

fn check_condition(cond: &Expr, construct: &str, scope: &Scope) -> Result<TypedExpr> {
    let cond = check_expression(cond, scope)?;
    if cond.ty != Type::Boolean {
        return Err(TypeError::new(
            format!(
                "Condition of '{}' must be Boolean, got {}",
                construct, cond.ty
            ),
            &cond.loc,
        ));
    }
    Ok(cond)
}

fn check_function(def: &FunctionDef, scope: &Scope) -> Result<TypedFunction> {
    let mut params = Vec::with_capacity(def.params.len());
    for param in &def.params {
        params.push((param.name.clone(), resolve_type(&param.ty)?));
    }
    let return_type = match &def.return_type {
        Some(ty) => resolve_type(ty)?,
        None => Type::Unit,
    };

    // Bind the function before checking the body so it can call itself.
    let param_types = params.iter().map(|(_, t)| t.clone()).collect();
    let fn_type = Type::function(param_types, return_type.clone());
    let binding = scope
        .bind(&def.name, fn_type, false)
        .map_err(|e| TypeError::new(e.to_string(), &def.loc))?;

    let frame = scope
        .child_frame(&params)
        .map_err(|e| TypeError::new(e.to_string(), &def.loc))?;
    let body = check_expression(&def.body, &frame)?;
    if return_type != Type::Unit && body.ty != return_type {
        return Err(TypeError::new(
            format!(
                "Function '{}' declares return type {}, got {}",
                def.name, return_type, body.ty
            ),
            &def.loc,
        ));
    }

    let param_bindings = def
        .params
        .iter()
        .map(|p| {
            frame.lookup(&p.name).ok_or_else(|| {
                TypeError::new(format!("Unable to resolve name '{}'", p.name), &p.loc)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TypedFunction {
        binding,
        params: param_bindings,
        return_type,
        body,
        loc: def.loc.clone(),
    })
}

fn resolve(name: &str, scope: &Scope, loc: &SourceLoc) -> Result<Rc<Binding>> {
    scope
        .lookup(name)
        .ok_or_else(|| TypeError::new(format!("Unable to resolve name '{}'", name), loc))
}

fn resolve_type(ty: &TypeExpr) -> Result<Type> {
    match ty {
        TypeExpr::Name { name, loc } => match name.as_str() {
            "Int" => Ok(Type::Int),
            "String" => Ok(Type::String),
            "Boolean" => Ok(Type::Boolean),
            "Unit" => Ok(Type::Unit),
            other => Err(TypeError::new(format!("Unknown type '{}'", other), loc)),
        },
        TypeExpr::Array { element, .. } => Ok(Type::array(resolve_type(element)?)),
        TypeExpr::Function { params, ret, .. } => {
            let params = params.iter().map(resolve_type).collect::<Result<Vec<_>>>()?;
            Ok(Type::function(params, resolve_type(ret)?))
        }
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::Int,
        Literal::Str(_) => Type::String,
        Literal::Bool(_) => Type::Boolean,
    }
}
