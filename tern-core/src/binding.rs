// tern-core - Resolved name bindings
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Resolved name bindings.

use crate::types::Type;

/// Where a binding's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A slot in the engine's global store.
    Global,
    /// A frame slot, addressed relative to the frame pointer.
    Local,
    /// A function parameter, stored below the current frame.
    Argument,
}

/// A resolved binding for a declared name.
///
/// Created exactly once per declaration by the owning scope and shared by
/// `Rc`; none of the fields change afterwards. The slot index is assigned
/// by the issuing counter (the global scope for globals, the owning frame
/// for locals, the parameter position for arguments).
#[derive(Debug, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub name: String,
    pub ty: Type,
    pub slot: usize,
    pub mutable: bool,
}
