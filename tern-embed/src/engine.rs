// tern-embed - Engine implementation
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! The Engine struct - main entry point for embedding Tern.

use std::rc::Rc;

use tern_core::{check_expression, check_unit, fold_expr, fold_unit, Scope, Type, TypedItem};
use tern_parser::{Expr, Item, Parser};
use tern_vm::{translate_function, translate_statement, Function, GlobalStore, Value, VM};

use crate::builtins;
use crate::error::{Error, Result};

/// The Tern evaluation engine.
///
/// `Engine` owns the persistent type scope and the global store, and runs
/// source fragments through the whole pipeline: parse, type check, fold,
/// translate, optimize, validate and execute. Definitions accumulate, so
/// each fragment sees everything earlier fragments bound.
///
/// # Thread Safety
///
/// **`Engine` is NOT thread-safe.** Values use `Rc` and `RefCell`
/// internally for single-threaded performance. Create one engine per
/// thread if you need concurrent evaluation.
///
/// # Example
///
/// ```rust
/// use tern_embed::{Engine, Value};
///
/// let mut engine = Engine::new().unwrap();
/// engine.evaluate_statement("var x = 4;").unwrap();
/// let result = engine.evaluate_expression("x * x").unwrap();
/// assert_eq!(result, Value::Int(16));
/// ```
pub struct Engine {
    scope: Scope,
    globals: GlobalStore,
}

impl Engine {
    /// Create an engine with the builtin natives registered.
    pub fn new() -> Result<Engine> {
        let mut engine = Engine::new_bare();
        builtins::install(&mut engine)?;
        Ok(engine)
    }

    /// Create an engine without the builtin natives.
    ///
    /// Useful when the host wants full control over what scripts can
    /// reach.
    pub fn new_bare() -> Engine {
        Engine {
            scope: Scope::global(),
            globals: GlobalStore::new(),
        }
    }

    /// Register a host value as an immutable global.
    ///
    /// The value is visible to every fragment evaluated afterwards, with
    /// the static type `ty`. Fails if `name` is already bound.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tern_embed::{native, Engine, Type, Value};
    ///
    /// let mut engine = Engine::new().unwrap();
    /// engine.bind("limit", Type::Int, Value::Int(10)).unwrap();
    /// engine
    ///     .bind(
    ///         "double",
    ///         Type::function(vec![Type::Int], Type::Int),
    ///         native("double", |args| match args[0].as_int() {
    ///             Some(n) => Ok(Value::Int(n * 2)),
    ///             None => Ok(Value::Unit),
    ///         }),
    ///     )
    ///     .unwrap();
    /// let result = engine.evaluate_expression("double(limit)").unwrap();
    /// assert_eq!(result, Value::Int(20));
    /// ```
    pub fn bind(&mut self, name: &str, ty: Type, value: Value) -> Result<()> {
        let binding = self
            .scope
            .bind(name, ty, false)
            .map_err(|e| Error::Engine(e.to_string()))?;
        self.globals.define(binding.slot, name, value)?;
        Ok(())
    }

    /// Evaluate a sequence of top-level items.
    ///
    /// Function definitions compile and install their function value;
    /// statements compile and run as they are reached. Returns the value
    /// of the last statement when it is an expression, `None` otherwise.
    ///
    /// A top-level `var` or `val` whose name is already a global replaces
    /// the old binding, so interactive sessions can re-declare names. The
    /// old binding is gone before the new initializer is checked.
    ///
    /// # Errors
    ///
    /// The first error from any stage aborts the fragment. A fragment
    /// that fails to parse or check leaves the engine untouched; once
    /// execution has started, effects of statements that already ran
    /// remain visible.
    pub fn evaluate_statement(&mut self, source: &str) -> Result<Option<Value>> {
        let items = Parser::parse_str(source)?;

        // Check against a copy of the scope. Top-level re-declarations
        // retire the old binding in the copy, so a failed fragment cannot
        // lose or half-bind anything.
        let scope = self.scope.fork();
        let mut retired = Vec::new();
        for item in &items {
            if let Item::Statement(Expr::Var { name, .. }) = item {
                if let Some(binding) = scope.lookup(name) {
                    scope.unbind(name);
                    retired.push(binding.slot);
                }
            }
        }
        let typed = check_unit(&items, &scope)?;

        self.scope = scope;
        for slot in retired {
            self.globals.unbind(slot);
        }
        let mut last = None;
        for item in fold_unit(typed) {
            last = self.run_item(item)?;
        }
        Ok(last)
    }

    /// Evaluate a single expression and return its value.
    pub fn evaluate_expression(&mut self, source: &str) -> Result<Value> {
        let expr = Parser::parse_expression_str(source)?;
        let typed = check_expression(&expr, &self.scope)?;
        let folded = fold_expr(typed);
        let code = translate_statement(&folded)?;
        let mut vm = VM::new(&mut self.globals);
        Ok(vm.run(Rc::new(code))?.unwrap_or(Value::Unit))
    }

    /// Compile a fragment and render the resulting code objects as
    /// address-annotated instruction listings.
    ///
    /// Compilation runs against a throwaway copy of the scope, so dumped
    /// declarations bind nothing and nothing executes.
    pub fn dump(&self, source: &str) -> Result<String> {
        let items = Parser::parse_str(source)?;
        let scope = self.scope.fork();
        let typed = check_unit(&items, &scope)?;
        let mut listings = Vec::new();
        for item in fold_unit(typed) {
            match item {
                TypedItem::Function(function) => {
                    let code = translate_function(&function)?;
                    listings.push(format!("{}:\n{}", function.binding.name, code));
                }
                TypedItem::Statement(statement) => {
                    let code = translate_statement(&statement)?;
                    listings.push(code.to_string());
                }
            }
        }
        Ok(listings.join("\n"))
    }

    /// The value of a global binding, if defined.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Value> {
        let binding = self.scope.lookup(name)?;
        self.globals.get(binding.slot).cloned()
    }

    /// Remove a global binding. Returns whether it existed.
    pub fn unbind(&mut self, name: &str) -> bool {
        match self.scope.lookup(name) {
            Some(binding) => {
                self.scope.unbind(name);
                self.globals.unbind(binding.slot);
                true
            }
            None => false,
        }
    }

    fn run_item(&mut self, item: TypedItem) -> Result<Option<Value>> {
        match item {
            TypedItem::Function(function) => {
                let code = translate_function(&function)?;
                let value = Value::Function(Rc::new(Function::Code {
                    name: Rc::from(function.binding.name.as_str()),
                    code: Rc::new(code),
                }));
                self.globals
                    .define(function.binding.slot, &function.binding.name, value)?;
                Ok(None)
            }
            TypedItem::Statement(statement) => {
                let code = translate_statement(&statement)?;
                let mut vm = VM::new(&mut self.globals);
                Ok(vm.run(Rc::new(code))?)
            }
        }
    }
}

// Note: Default is intentionally not implemented for Engine because
// Engine::new() can fail. Hosts should call Engine::new() and handle
// the Result.
