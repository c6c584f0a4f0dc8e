// tern-vm - Global store
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Slot-addressed storage for top-level bindings.
//!
//! The checker resolves every global name to a slot index, so the store is
//! a growable vector rather than a map. It still remembers each slot's name
//! and refuses definition over an occupied slot: the scope chain already
//! rules both out, and the store repeating the checks keeps a miscompiled
//! program from silently corrupting another binding.

use crate::value::Value;

use super::{Result, RuntimeError};

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Vacant,
    Bound {
        name: String,
        value: Value,
    },
}

/// The runtime store behind `LoadGlobal` and `StoreGlobal`.
#[derive(Debug, Default)]
pub struct GlobalStore {
    slots: Vec<Slot>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn grow_to(&mut self, slot: usize) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, Slot::Vacant);
        }
    }

    /// Install a definition at a vacant slot. Fails if the slot is taken.
    pub fn define(&mut self, slot: usize, name: &str, value: Value) -> Result<()> {
        self.grow_to(slot);
        match &self.slots[slot] {
            Slot::Vacant => {
                self.slots[slot] = Slot::Bound {
                    name: name.to_string(),
                    value,
                };
                Ok(())
            }
            Slot::Bound { name: taken, .. } => Err(RuntimeError::Internal(format!(
                "global slot {} already bound to '{}'",
                slot, taken
            ))),
        }
    }

    /// Write a slot, creating or replacing its value. This is the
    /// `StoreGlobal` path, so declared-then-assigned globals work.
    pub fn store(&mut self, slot: usize, name: &str, value: Value) {
        self.grow_to(slot);
        self.slots[slot] = Slot::Bound {
            name: name.to_string(),
            value,
        };
    }

    /// Read a slot. `name` is the source name carried by the instruction,
    /// used for the diagnostic when the slot is vacant.
    pub fn load(&self, slot: usize, name: &str) -> Result<Value> {
        match self.slots.get(slot) {
            Some(Slot::Bound { value, .. }) => Ok(value.clone()),
            _ => Err(RuntimeError::UnboundGlobal(name.to_string())),
        }
    }

    /// Read a slot without an instruction in hand, for host inspection.
    pub fn get(&self, slot: usize) -> Option<&Value> {
        match self.slots.get(slot) {
            Some(Slot::Bound { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Vacate a slot so its index can never resolve again.
    pub fn unbind(&mut self, slot: usize) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Slot::Vacant;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_refuses_an_occupied_slot() {
        let mut globals = GlobalStore::new();
        globals.define(0, "x", Value::Int(1)).unwrap();
        assert!(matches!(
            globals.define(0, "y", Value::Int(2)),
            Err(RuntimeError::Internal(_))
        ));
        assert_eq!(globals.load(0, "x").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_store_writes_through() {
        let mut globals = GlobalStore::new();
        globals.store(2, "x", Value::Int(5));
        assert_eq!(globals.load(2, "x").unwrap(), Value::Int(5));
        globals.store(2, "x", Value::Int(6));
        assert_eq!(globals.load(2, "x").unwrap(), Value::Int(6));
        assert_eq!(globals.get(1), None);
    }

    #[test]
    fn test_vacant_reads_are_unbound() {
        let mut globals = GlobalStore::new();
        assert_eq!(
            globals.load(0, "missing"),
            Err(RuntimeError::UnboundGlobal("missing".to_string()))
        );
        globals.store(0, "x", Value::Int(1));
        globals.unbind(0);
        assert_eq!(
            globals.load(0, "x"),
            Err(RuntimeError::UnboundGlobal("x".to_string()))
        );
    }
}
