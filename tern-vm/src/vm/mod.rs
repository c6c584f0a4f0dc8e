// tern-vm - Stack machine
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The stack machine.
//!
//! Execution state is a program counter inside the current call frame, an
//! operand stack, a frame pointer into the growable data area, and a
//! slot-addressed global store. The loop fetches the opcode at the pc,
//! advances the pc, and dispatches; it halts when the pc of the bottom
//! frame reaches the end of its code. The result of a run is the value left
//! on the operand stack, or nothing when the stack ends empty.
//!
//! A call frame in the data area is laid out as arguments, the caller's
//! saved frame pointer, then locals, with `fp` addressing the first local.
//! `Call` appends the arguments and pushes a control frame; the callee's
//! `Enter` saves `fp` and reserves its locals; `Leave` unwinds the data
//! area around the return value; `Ret` pops the control frame.

pub mod data;
pub mod error;
pub mod globals;
pub mod stack;

pub use data::DataArea;
pub use error::{Result, RuntimeError};
pub use globals::GlobalStore;
pub use stack::ValueStack;

use std::cmp::Ordering;
use std::rc::Rc;

use crate::code::{CodeObject, LineInfo, OpCode};
use crate::value::{Function, Value};

/// Upper bound on nested calls.
pub const MAX_CALL_DEPTH: usize = 1024;

/// One active code object and its program counter.
#[derive(Debug)]
struct CallFrame {
    code: Rc<CodeObject>,
    pc: usize,
}

/// The virtual machine. One instance runs one top-level unit; the global
/// store lives outside it and carries state from statement to statement.
pub struct VM<'a> {
    stack: ValueStack,
    data: DataArea,
    fp: usize,
    frames: Vec<CallFrame>,
    globals: &'a mut GlobalStore,
}

impl<'a> VM<'a> {
    pub fn new(globals: &'a mut GlobalStore) -> Self {
        Self {
            stack: ValueStack::new(),
            data: DataArea::new(),
            fp: 0,
            frames: Vec::new(),
            globals,
        }
    }

    /// Run a unit of code to completion.
    pub fn run(&mut self, code: Rc<CodeObject>) -> Result<Option<Value>> {
        self.data.reserve(code.frame_size());
        self.frames.push(CallFrame { code, pc: 0 });
        self.run_loop()?;
        if self.stack.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.stack.pop()?))
        }
    }

    fn run_loop(&mut self) -> Result<()> {
        while let Some((op, line)) = self.fetch()? {
            match op {
                OpCode::Push(value) => self.stack.push(value),
                OpCode::Pop => {
                    self.stack.pop()?;
                }
                OpCode::Dup => {
                    let top = self.stack.peek(0)?;
                    self.stack.push(top);
                }

                OpCode::Add => {
                    let (a, b) = self.int_operands()?;
                    self.stack.push(Value::Int(a.wrapping_add(b)));
                }
                OpCode::Sub => {
                    let (a, b) = self.int_operands()?;
                    self.stack.push(Value::Int(a.wrapping_sub(b)));
                }
                OpCode::Mul => {
                    let (a, b) = self.int_operands()?;
                    self.stack.push(Value::Int(a.wrapping_mul(b)));
                }
                OpCode::Div => {
                    let (a, b) = self.int_operands()?;
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero {
                            line: line.line,
                            column: line.column,
                        });
                    }
                    self.stack.push(Value::Int(a.wrapping_div(b)));
                }
                OpCode::Concat => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    match a {
                        Value::Str(prefix) => {
                            self.stack
                                .push(Value::str(format!("{}{}", prefix, b.to_text())));
                        }
                        other => {
                            return Err(RuntimeError::Internal(format!(
                                "concatenation onto {}",
                                other.type_name()
                            )));
                        }
                    }
                }
                OpCode::Not => {
                    let operand = self.pop_bool()?;
                    self.stack.push(Value::Bool(!operand));
                }

                OpCode::Equal => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    self.stack.push(Value::Bool(a == b));
                }
                OpCode::NotEqual => {
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    self.stack.push(Value::Bool(a != b));
                }
                OpCode::Less => self.ordered(Ordering::is_lt)?,
                OpCode::LessEq => self.ordered(Ordering::is_le)?,
                OpCode::Greater => self.ordered(Ordering::is_gt)?,
                OpCode::GreaterEq => self.ordered(Ordering::is_ge)?,

                OpCode::LoadLocal(slot) => {
                    let value = self.data.load(self.fp + slot)?;
                    self.stack.push(value);
                }
                OpCode::StoreLocal(slot) => {
                    let value = self.stack.pop()?;
                    self.data.store(self.fp + slot, value)?;
                }
                OpCode::LoadGlobal { slot, name } => {
                    let value = self.globals.load(slot, &name)?;
                    self.stack.push(value);
                }
                OpCode::StoreGlobal { slot, name } => {
                    let value = self.stack.pop()?;
                    self.globals.store(slot, &name, value);
                }
                OpCode::LoadArgument(slot) => {
                    let index = self.argument_index(slot)?;
                    let value = self.data.load(index)?;
                    self.stack.push(value);
                }

                OpCode::Jump(address) => self.set_pc(address)?,
                OpCode::Branch(address) => {
                    // Taken when the condition is false.
                    if !self.pop_bool()? {
                        self.set_pc(address)?;
                    }
                }
                OpCode::Call(argc) => self.call(argc)?,
                OpCode::Enter(frame_size) => {
                    self.data.push(Value::Int(self.fp as i64));
                    self.fp = self.data.len();
                    self.data.reserve(frame_size);
                }
                OpCode::Leave(param_count) => self.leave(param_count)?,
                OpCode::Ret => {
                    if self.frames.len() < 2 {
                        return Err(RuntimeError::Internal(
                            "return outside a call".to_string(),
                        ));
                    }
                    self.frames.pop();
                }
            }
        }
        Ok(())
    }

    /// The opcode at the pc, or `None` when the unit has run to its end.
    fn fetch(&mut self) -> Result<Option<(OpCode, LineInfo)>> {
        let depth = self.frames.len();
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| RuntimeError::Internal("no active frame".to_string()))?;
        let Some(op) = frame.code.op(frame.pc) else {
            if depth == 1 {
                return Ok(None);
            }
            return Err(RuntimeError::Internal(
                "function body ran off the end of its code".to_string(),
            ));
        };
        let fetched = (op.clone(), frame.code.line_info(frame.pc));
        frame.pc += 1;
        Ok(Some(fetched))
    }

    fn set_pc(&mut self, address: usize) -> Result<()> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeError::Internal("no active frame".to_string()))?
            .pc = address;
        Ok(())
    }

    fn int_operands(&mut self) -> Result<(i64, i64)> {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        match (a, b) {
            (Value::Int(a), Value::Int(b)) => Ok((a, b)),
            (a, b) => Err(RuntimeError::Internal(format!(
                "arithmetic on {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn pop_bool(&mut self) -> Result<bool> {
        match self.stack.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::Internal(format!(
                "expected a Boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn ordered(&mut self, test: impl Fn(Ordering) -> bool) -> Result<()> {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        let ordering = a.compare(&b).ok_or_else(|| {
            RuntimeError::Internal(format!(
                "ordering between {} and {}",
                a.type_name(),
                b.type_name()
            ))
        })?;
        self.stack.push(Value::Bool(test(ordering)));
        Ok(())
    }

    /// Absolute data-area index of argument `slot` in the current frame.
    fn argument_index(&self, slot: usize) -> Result<usize> {
        let param_count = self
            .frames
            .last()
            .map(|frame| frame.code.param_count())
            .ok_or_else(|| RuntimeError::Internal("no active frame".to_string()))?;
        // Arguments sit below the saved fp: slot i lives at
        // fp - 1 - (param_count - i).
        let offset = param_count
            .checked_sub(slot)
            .filter(|distance| *distance > 0)
            .ok_or_else(|| {
                RuntimeError::Internal(format!("argument slot {} outside the frame", slot))
            })?;
        self.fp.checked_sub(1 + offset).ok_or_else(|| {
            RuntimeError::Internal("argument read outside a call frame".to_string())
        })
    }

    fn call(&mut self, argc: usize) -> Result<()> {
        let callee = self.stack.pop()?;
        let args = self.stack.pop_n(argc)?;
        let function = match callee {
            Value::Function(function) => function,
            other => return Err(RuntimeError::NotCallable(other.type_name())),
        };
        match &*function {
            Function::Native { f, .. } => {
                let result = f(&args)?;
                self.stack.push(result);
            }
            Function::Code { name, code } => {
                if self.frames.len() >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::CallStackOverflow);
                }
                if args.len() != code.param_count() {
                    return Err(RuntimeError::Internal(format!(
                        "call to '{}' with {} arguments, expected {}",
                        name,
                        args.len(),
                        code.param_count()
                    )));
                }
                for arg in args {
                    self.data.push(arg);
                }
                self.frames.push(CallFrame {
                    code: Rc::clone(code),
                    pc: 0,
                });
            }
        }
        Ok(())
    }

    fn leave(&mut self, param_count: usize) -> Result<()> {
        let result = self.stack.pop()?;
        if self.fp == 0 {
            return Err(RuntimeError::Internal("no saved frame pointer".to_string()));
        }
        let caller_fp = match self.data.load(self.fp - 1)? {
            Value::Int(saved) if saved >= 0 => saved as usize,
            _ => return Err(RuntimeError::Internal("corrupted frame".to_string())),
        };
        let base = (self.fp - 1).checked_sub(param_count).ok_or_else(|| {
            RuntimeError::Internal("corrupted frame".to_string())
        })?;
        self.data.truncate(base);
        self.fp = caller_fp;
        self.stack.push(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodeBuilder;
    use crate::value::native;

    fn line() -> LineInfo {
        LineInfo::new(1, 1)
    }

    fn assemble(ops: Vec<OpCode>, param_count: usize) -> Rc<CodeObject> {
        let mut builder = CodeBuilder::new();
        for op in ops {
            builder.push(op, line());
        }
        Rc::new(builder.finish(param_count))
    }

    fn run(ops: Vec<OpCode>) -> Result<Option<Value>> {
        let mut globals = GlobalStore::new();
        VM::new(&mut globals).run(assemble(ops, 0))
    }

    #[test]
    fn test_arithmetic_leaves_the_result() {
        let result = run(vec![
            OpCode::Push(Value::Int(3)),
            OpCode::Push(Value::Int(4)),
            OpCode::Push(Value::Int(5)),
            OpCode::Mul,
            OpCode::Add,
        ]);
        assert_eq!(result.unwrap(), Some(Value::Int(23)));
    }

    #[test]
    fn test_empty_stack_means_no_result() {
        assert_eq!(run(vec![]).unwrap(), None);
        assert_eq!(
            run(vec![OpCode::Push(Value::Int(1)), OpCode::Pop]).unwrap(),
            None
        );
    }

    #[test]
    fn test_division_by_zero_reports_the_position() {
        let mut globals = GlobalStore::new();
        let mut builder = CodeBuilder::new();
        builder.push(OpCode::Push(Value::Int(1)), LineInfo::new(2, 5));
        builder.push(OpCode::Push(Value::Int(0)), LineInfo::new(2, 9));
        builder.push(OpCode::Div, LineInfo::new(2, 7));
        let result = VM::new(&mut globals).run(Rc::new(builder.finish(0)));
        assert_eq!(
            result,
            Err(RuntimeError::DivisionByZero { line: 2, column: 7 })
        );
    }

    #[test]
    fn test_branch_is_taken_when_false() {
        let result = run(vec![
            OpCode::Push(Value::Bool(false)),
            OpCode::Branch(3),
            OpCode::Push(Value::Int(1)),
            OpCode::Push(Value::Int(2)),
        ]);
        assert_eq!(result.unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn test_globals_flow_between_runs() {
        let mut globals = GlobalStore::new();
        let store = assemble(
            vec![
                OpCode::Push(Value::Int(9)),
                OpCode::StoreGlobal {
                    slot: 0,
                    name: "x".to_string(),
                },
            ],
            0,
        );
        let load = assemble(
            vec![OpCode::LoadGlobal {
                slot: 0,
                name: "x".to_string(),
            }],
            0,
        );
        assert_eq!(VM::new(&mut globals).run(store).unwrap(), None);
        assert_eq!(
            VM::new(&mut globals).run(load).unwrap(),
            Some(Value::Int(9))
        );
    }

    #[test]
    fn test_calling_a_code_function() {
        // fun double(n: Int): Int = n + n
        let double = assemble(
            vec![
                OpCode::Enter(0),
                OpCode::LoadArgument(0),
                OpCode::LoadArgument(0),
                OpCode::Add,
                OpCode::Leave(1),
                OpCode::Ret,
            ],
            1,
        );
        let function = Value::Function(Rc::new(Function::Code {
            name: Rc::from("double"),
            code: double,
        }));
        let mut globals = GlobalStore::new();
        globals.define(0, "double", function).unwrap();
        let unit = assemble(
            vec![
                OpCode::Push(Value::Int(21)),
                OpCode::LoadGlobal {
                    slot: 0,
                    name: "double".to_string(),
                },
                OpCode::Call(1),
            ],
            0,
        );
        let mut vm = VM::new(&mut globals);
        assert_eq!(vm.run(unit).unwrap(), Some(Value::Int(42)));
        // The callee's arguments and frame are gone again.
        assert!(vm.data.is_empty());
    }

    #[test]
    fn test_calling_a_native_function() {
        let mut globals = GlobalStore::new();
        globals
            .define(0, "sum", native("sum", |args| {
                let mut total = 0;
                for arg in args {
                    total += arg.as_int().ok_or_else(|| {
                        RuntimeError::Internal("sum expects Int".to_string())
                    })?;
                }
                Ok(Value::Int(total))
            }))
            .unwrap();
        let unit = assemble(
            vec![
                OpCode::Push(Value::Int(1)),
                OpCode::Push(Value::Int(2)),
                OpCode::Push(Value::Int(3)),
                OpCode::LoadGlobal {
                    slot: 0,
                    name: "sum".to_string(),
                },
                OpCode::Call(3),
            ],
            0,
        );
        assert_eq!(
            VM::new(&mut globals).run(unit).unwrap(),
            Some(Value::Int(6))
        );
    }

    #[test]
    fn test_calling_a_non_function_is_internal() {
        let result = run(vec![
            OpCode::Push(Value::Int(7)),
            OpCode::Call(0),
        ]);
        assert_eq!(result, Err(RuntimeError::NotCallable("Int")));
    }

    #[test]
    fn test_runaway_recursion_overflows() {
        // fun forever(): Int = forever()
        let forever = assemble(
            vec![
                OpCode::Enter(0),
                OpCode::LoadGlobal {
                    slot: 0,
                    name: "forever".to_string(),
                },
                OpCode::Call(0),
                OpCode::Leave(0),
                OpCode::Ret,
            ],
            0,
        );
        let mut globals = GlobalStore::new();
        globals
            .define(
                0,
                "forever",
                Value::Function(Rc::new(Function::Code {
                    name: Rc::from("forever"),
                    code: forever,
                })),
            )
            .unwrap();
        let unit = assemble(
            vec![
                OpCode::LoadGlobal {
                    slot: 0,
                    name: "forever".to_string(),
                },
                OpCode::Call(0),
            ],
            0,
        );
        assert_eq!(
            VM::new(&mut globals).run(unit),
            Err(RuntimeError::CallStackOverflow)
        );
    }

    #[test]
    fn test_locals_are_frame_relative() {
        // Callee writes local 0 without clobbering the unit's local 0.
        let callee = assemble(
            vec![
                OpCode::Enter(1),
                OpCode::Push(Value::Int(99)),
                OpCode::StoreLocal(0),
                OpCode::LoadLocal(0),
                OpCode::Leave(0),
                OpCode::Ret,
            ],
            0,
        );
        let mut globals = GlobalStore::new();
        globals
            .define(
                0,
                "f",
                Value::Function(Rc::new(Function::Code {
                    name: Rc::from("f"),
                    code: callee,
                })),
            )
            .unwrap();
        let unit = assemble(
            vec![
                OpCode::Push(Value::Int(1)),
                OpCode::StoreLocal(0),
                OpCode::LoadGlobal {
                    slot: 0,
                    name: "f".to_string(),
                },
                OpCode::Call(0),
                OpCode::Pop,
                OpCode::LoadLocal(0),
            ],
            0,
        );
        assert_eq!(
            VM::new(&mut globals).run(unit).unwrap(),
            Some(Value::Int(1))
        );
    }
}
