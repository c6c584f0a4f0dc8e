// tern-core - Scope chain for binding resolution
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Scope chain for lexical binding resolution.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::binding::{Binding, BindingKind};
use crate::types::Type;

/// Error from a scope operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The name is already bound in the same scope.
    AlreadyBound(String),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::AlreadyBound(name) => {
                write!(f, "Name '{}' is already bound in this scope", name)
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// A scope for name bindings.
///
/// Scopes form a chain through parent references. The chain root is the
/// global scope: it issues `Global` bindings and holds the engine-lifetime
/// global slot counter. Every other scope issues `Local` bindings whose
/// slots come from the owning frame's counter: a frame-owning scope
/// (function entry, top-level block) starts a fresh counter, while a
/// frame-sharing block scope reuses its parent's, so sibling nested blocks
/// receive distinct slots within one frame. Counters never rewind.
///
/// # Examples
///
/// ```
/// use tern_core::{BindingKind, Scope, Type};
///
/// let global = Scope::global();
/// let x = global.bind("x", Type::Int, true).unwrap();
/// assert_eq!(x.kind, BindingKind::Global);
///
/// // A child frame can shadow the global; the outer binding is intact.
/// let frame = global.child_frame(&[]).unwrap();
/// let inner = frame.bind("x", Type::Boolean, false).unwrap();
/// assert_eq!(inner.kind, BindingKind::Local);
/// assert_eq!(frame.lookup("x").unwrap().ty, Type::Boolean);
/// assert_eq!(global.lookup("x").unwrap().ty, Type::Int);
/// ```
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

#[derive(Debug)]
struct ScopeInner {
    bindings: HashMap<String, Rc<Binding>>,
    parent: Option<Scope>,
    /// The global slot counter at the chain root, the owning frame's local
    /// slot counter everywhere else.
    counter: Rc<Cell<usize>>,
}

impl Scope {
    /// Create the global scope at the root of a chain.
    pub fn global() -> Self {
        Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                bindings: HashMap::new(),
                parent: None,
                counter: Rc::new(Cell::new(0)),
            })),
        }
    }

    /// Create a frame-owning child scope with a fresh local counter.
    ///
    /// Each parameter is pre-bound as an immutable `Argument` with its
    /// positional slot. Fails when two parameters share a name.
    pub fn child_frame(&self, params: &[(String, Type)]) -> Result<Self, ScopeError> {
        let child = Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
                counter: Rc::new(Cell::new(0)),
            })),
        };
        {
            let mut inner = child.inner.borrow_mut();
            for (slot, (name, ty)) in params.iter().enumerate() {
                if inner.bindings.contains_key(name) {
                    return Err(ScopeError::AlreadyBound(name.clone()));
                }
                let binding = Rc::new(Binding {
                    kind: BindingKind::Argument,
                    name: name.clone(),
                    ty: ty.clone(),
                    slot,
                    mutable: false,
                });
                inner.bindings.insert(name.clone(), binding);
            }
        }
        Ok(child)
    }

    /// Create a frame-sharing child block scope (same local counter as
    /// this scope).
    #[must_use]
    pub fn child_block(&self) -> Self {
        let counter = Rc::clone(&self.inner.borrow().counter);
        Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
                counter,
            })),
        }
    }

    /// Bind a new name in this scope.
    ///
    /// Issues a `Global` binding at the chain root and a `Local` binding
    /// elsewhere, taking the next slot from the issuing counter. Fails
    /// when the name is already bound in this scope (shadowing an outer
    /// scope is fine).
    pub fn bind(&self, name: &str, ty: Type, mutable: bool) -> Result<Rc<Binding>, ScopeError> {
        let mut inner = self.inner.borrow_mut();
        if inner.bindings.contains_key(name) {
            return Err(ScopeError::AlreadyBound(name.to_string()));
        }
        let kind = if inner.parent.is_none() {
            BindingKind::Global
        } else {
            BindingKind::Local
        };
        let slot = inner.counter.get();
        inner.counter.set(slot + 1);
        let binding = Rc::new(Binding {
            kind,
            name: name.to_string(),
            ty,
            slot,
            mutable,
        });
        inner.bindings.insert(name.to_string(), Rc::clone(&binding));
        Ok(binding)
    }

    /// Look up a name in this scope or the parent chain, innermost first.
    /// Uses iterative traversal to avoid stack overflow on deep chains.
    pub fn lookup(&self, name: &str) -> Option<Rc<Binding>> {
        let mut current = self.clone();
        loop {
            let inner = current.inner.borrow();
            if let Some(binding) = inner.bindings.get(name) {
                return Some(Rc::clone(binding));
            }
            let parent = inner.parent.clone();
            drop(inner);
            match parent {
                Some(p) => current = p,
                None => return None,
            }
        }
    }

    /// Remove a binding from this scope (not the parent chain). Returns
    /// whether the name was bound.
    ///
    /// Used on the global scope for top-level re-declaration; the retired
    /// slot is never reissued.
    pub fn unbind(&self, name: &str) -> bool {
        self.inner.borrow_mut().bindings.remove(name).is_some()
    }

    /// Whether this is the chain root.
    pub fn is_global(&self) -> bool {
        self.inner.borrow().parent.is_none()
    }

    /// Snapshot this scope into an independent copy.
    ///
    /// The copy shares the `Binding`s but owns its bindings map and a
    /// counter frozen at the current value, so binds in the copy never
    /// affect the original. Used for side-effect-free compilation.
    #[must_use]
    pub fn fork(&self) -> Self {
        let inner = self.inner.borrow();
        Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                bindings: inner.bindings.clone(),
                parent: inner.parent.clone(),
                counter: Rc::new(Cell::new(inner.counter.get())),
            })),
        }
    }
}
