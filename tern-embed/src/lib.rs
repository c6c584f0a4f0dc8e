// tern-embed - Embedding API for Tern
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! # tern-embed
//!
//! A high-level embedding API for the Tern programming language.
//!
//! This crate wires the pipeline crates together behind one type:
//! [`Engine`] parses, type checks, folds, translates, optimizes,
//! validates and executes Tern source, keeping definitions between
//! calls so hosts can drive interactive sessions.
//!
//! ## Quick Start
//!
//! ```rust
//! use tern_embed::Engine;
//!
//! let mut engine = Engine::new().unwrap();
//! engine.evaluate_statement("fun double(n: Int): Int = n * 2;").unwrap();
//! let result = engine.evaluate_expression("double(21)").unwrap();
//! assert_eq!(result.to_string(), "42");
//! ```
//!
//! ## Registering Native Functions
//!
//! ```rust
//! use tern_embed::{native, Engine, Type, Value};
//!
//! let mut engine = Engine::new().unwrap();
//! engine
//!     .bind(
//!         "greet",
//!         Type::function(vec![Type::String], Type::String),
//!         native("greet", |args| {
//!             let name = args[0].as_str().unwrap_or("world");
//!             Ok(Value::str(format!("Hello, {}!", name)))
//!         }),
//!     )
//!     .unwrap();
//! let result = engine.evaluate_expression("greet(\"Tern\")").unwrap();
//! assert_eq!(result, Value::str("Hello, Tern!"));
//! ```

mod builtins;
mod engine;
mod error;

pub use engine::Engine;
pub use error::{Error, Result};

// Re-export the types hosts touch through the engine surface.
pub use tern_core::Type;
pub use tern_vm::{native, Function, RuntimeError, Value};
