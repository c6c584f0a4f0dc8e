// tern-vm - Typed-tree lowering
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Lowering from checked trees to code objects.
//!
//! Statements lower to instruction runs that leave the operand stack where
//! they found it; expressions lower to runs that push exactly one value.
//! The translator emits symbolic [`Ir`], runs the peephole pass, validates
//! stack balance over the basic-block graph, and resolves labels into an
//! immutable [`CodeObject`].
//!
//! Function definitions are translated in two steps: the body becomes its
//! own code object, which is then spliced between an `Enter`/`Leave`/`Ret`
//! calling-convention wrapper by relocation.

use std::rc::Rc;

use tern_core::{BinOp, Binding, BindingKind, ExprKind, Type, TypedExpr, TypedFunction};
use tern_parser::{Literal, RelOp, SourceLoc};

use crate::block;
use crate::code::{self, CodeBuilder, CodeObject, LineInfo, OpCode};
use crate::ir::{InternalError, Ir, Label, Result};
use crate::peephole;
use crate::value::Value;

/// Translate one top-level statement into runnable code.
///
/// When the statement is itself an expression, its value is left on the
/// stack as the unit's result. Declarations, loops, and blocks leave the
/// stack empty, so running them yields no value.
pub fn translate_statement(statement: &TypedExpr) -> Result<CodeObject> {
    let mut translator = Translator::new();
    match statement.kind {
        ExprKind::Var { .. } | ExprKind::While { .. } | ExprKind::Block(_) => {
            translator.statement(statement)?;
        }
        _ => translator.expression(statement)?,
    }
    translator.finish(0)
}

/// Translate a function definition into a callable code object.
pub fn translate_function(function: &TypedFunction) -> Result<CodeObject> {
    let mut translator = Translator::new();
    if function.return_type == Type::Unit {
        // A Unit function may have a body of any type; whatever it leaves
        // behind is discarded and the caller receives the unit value.
        translator.statement(&function.body)?;
        translator.emit(Ir::Push(Value::Unit), &function.loc);
    } else {
        translator.expression(&function.body)?;
    }
    let body = translator.finish(function.params.len())?;

    let line = line_info(&function.loc);
    let mut builder = CodeBuilder::new();
    builder.push(OpCode::Enter(body.frame_size()), line);
    builder.append_relocated(&body, 0);
    builder.push(OpCode::Leave(function.params.len()), line);
    builder.push(OpCode::Ret, line);
    Ok(builder.finish(function.params.len()))
}

#[derive(Default)]
struct Translator {
    stream: Vec<(Ir, LineInfo)>,
    next_label: usize,
}

impl Translator {
    fn new() -> Translator {
        Translator::default()
    }

    fn finish(self, param_count: usize) -> Result<CodeObject> {
        let stream = peephole::optimize(self.stream);
        block::validate(&stream)?;
        code::resolve(&stream, param_count)
    }

    fn fresh_label(&mut self) -> Label {
        let label = Label::new(self.next_label);
        self.next_label += 1;
        label
    }

    fn emit(&mut self, ir: Ir, loc: &SourceLoc) {
        self.stream.push((ir, line_info(loc)));
    }

    /// Lower `expr` in statement position: net stack effect zero.
    fn statement(&mut self, expr: &TypedExpr) -> Result<()> {
        match &expr.kind {
            ExprKind::Var { binding, value } | ExprKind::Assign { binding, value } => {
                self.expression(value)?;
                self.store(binding, &expr.loc)
            }
            ExprKind::While { cond, body } => {
                let head = self.fresh_label();
                let exit = self.fresh_label();
                self.emit(Ir::Label(head.clone()), &expr.loc);
                self.expression(cond)?;
                self.emit(Ir::Branch(exit.clone()), &cond.loc);
                self.statement(body)?;
                self.emit(Ir::Jump(head), &expr.loc);
                self.emit(Ir::Label(exit), &expr.loc);
                Ok(())
            }
            ExprKind::Block(statements) => {
                for statement in statements {
                    self.statement(statement)?;
                }
                Ok(())
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expression(cond)?;
                match else_branch {
                    Some(alternative) => {
                        let alt = self.fresh_label();
                        let join = self.fresh_label();
                        self.emit(Ir::Branch(alt.clone()), &cond.loc);
                        self.statement(then_branch)?;
                        self.emit(Ir::Jump(join.clone()), &expr.loc);
                        self.emit(Ir::Label(alt), &expr.loc);
                        self.statement(alternative)?;
                        self.emit(Ir::Label(join), &expr.loc);
                    }
                    None => {
                        let join = self.fresh_label();
                        self.emit(Ir::Branch(join.clone()), &cond.loc);
                        self.statement(then_branch)?;
                        self.emit(Ir::Label(join), &expr.loc);
                    }
                }
                Ok(())
            }
            // A bare expression in statement position: evaluate and discard.
            _ => {
                self.expression(expr)?;
                self.emit(Ir::Pop, &expr.loc);
                Ok(())
            }
        }
    }

    /// Lower `expr` in expression position: net stack effect plus one.
    fn expression(&mut self, expr: &TypedExpr) -> Result<()> {
        match &expr.kind {
            ExprKind::Lit(literal) => {
                self.emit(Ir::Push(literal_value(literal)), &expr.loc);
                Ok(())
            }
            ExprKind::Ref(binding) => {
                self.load(binding, &expr.loc);
                Ok(())
            }
            ExprKind::Not(operand) => {
                self.expression(operand)?;
                self.emit(Ir::Not, &expr.loc);
                Ok(())
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.expression(lhs)?;
                self.expression(rhs)?;
                self.emit(binary_ir(*op), &expr.loc);
                Ok(())
            }
            ExprKind::Assign { binding, value } => {
                self.expression(value)?;
                self.store(binding, &expr.loc)?;
                self.emit(Ir::Push(Value::Unit), &expr.loc);
                Ok(())
            }
            // A Unit conditional used as an expression runs its arms as
            // statements and produces the unit value at the join.
            ExprKind::If { .. } if expr.ty == Type::Unit => {
                self.statement(expr)?;
                self.emit(Ir::Push(Value::Unit), &expr.loc);
                Ok(())
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let alternative = else_branch.as_deref().ok_or_else(|| {
                    InternalError::Unexpected(
                        "value conditional without an alternative".to_string(),
                    )
                })?;
                let alt = self.fresh_label();
                let join = self.fresh_label();
                self.expression(cond)?;
                self.emit(Ir::Branch(alt.clone()), &cond.loc);
                self.expression(then_branch)?;
                self.emit(Ir::Jump(join.clone()), &expr.loc);
                self.emit(Ir::Label(alt), &expr.loc);
                self.expression(alternative)?;
                self.emit(Ir::Label(join), &expr.loc);
                Ok(())
            }
            ExprKind::ExprList(elements) => {
                if elements.is_empty() {
                    self.emit(Ir::Push(Value::Unit), &expr.loc);
                    return Ok(());
                }
                let last = elements.len() - 1;
                for (index, element) in elements.iter().enumerate() {
                    self.expression(element)?;
                    if index != last {
                        self.emit(Ir::Pop, &element.loc);
                    }
                }
                Ok(())
            }
            ExprKind::Call { callee, args } => {
                for arg in args {
                    self.expression(arg)?;
                }
                self.expression(callee)?;
                self.emit(Ir::Call(args.len()), &expr.loc);
                Ok(())
            }
            ExprKind::Var { .. } | ExprKind::While { .. } | ExprKind::Block(_) => {
                Err(InternalError::Unexpected(format!(
                    "statement in expression position at {}",
                    expr.loc
                )))
            }
        }
    }

    fn load(&mut self, binding: &Rc<Binding>, loc: &SourceLoc) {
        let name = binding.name.clone();
        let slot = binding.slot;
        let ir = match binding.kind {
            BindingKind::Local => Ir::LoadLocal { slot, name },
            BindingKind::Global => Ir::LoadGlobal { slot, name },
            BindingKind::Argument => Ir::LoadArgument { slot, name },
        };
        self.emit(ir, loc);
    }

    fn store(&mut self, binding: &Rc<Binding>, loc: &SourceLoc) -> Result<()> {
        let name = binding.name.clone();
        let slot = binding.slot;
        let ir = match binding.kind {
            BindingKind::Local => Ir::StoreLocal { slot, name },
            BindingKind::Global => Ir::StoreGlobal { slot, name },
            BindingKind::Argument => {
                return Err(InternalError::Unexpected(format!(
                    "assignment to argument '{}'",
                    binding.name
                )));
            }
        };
        self.emit(ir, loc);
        Ok(())
    }
}

fn line_info(loc: &SourceLoc) -> LineInfo {
    LineInfo::new(loc.line as u32, loc.column as u32)
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Str(s) => Value::str(s),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

fn binary_ir(op: BinOp) -> Ir {
    match op {
        BinOp::Add => Ir::Add,
        BinOp::Sub => Ir::Sub,
        BinOp::Mul => Ir::Mul,
        BinOp::Div => Ir::Div,
        BinOp::Concat => Ir::Concat,
        BinOp::Rel(RelOp::Eq) => Ir::Equal,
        BinOp::Rel(RelOp::Ne) => Ir::NotEqual,
        BinOp::Rel(RelOp::Lt) => Ir::Less,
        BinOp::Rel(RelOp::Le) => Ir::LessEq,
        BinOp::Rel(RelOp::Gt) => Ir::Greater,
        BinOp::Rel(RelOp::Ge) => Ir::GreaterEq,
    }
}
