// tern-vm - Frame data area
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Growable, integer-addressed storage for arguments, saved frame pointers,
//! and locals.
//!
//! A call's frame occupies a contiguous run of slots: the arguments, the
//! caller's saved frame pointer, then the locals. The frame pointer the
//! machine carries always addresses the first local, so locals live at
//! `fp + slot` and arguments below `fp`. Local slots start out unwritten,
//! and the checker guarantees every read is preceded by a write; a read of
//! an unwritten slot therefore reports an internal error.

use crate::value::Value;

use super::{Result, RuntimeError};

/// The machine's frame storage.
#[derive(Debug, Default)]
pub struct DataArea {
    slots: Vec<Option<Value>>,
}

impl DataArea {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(256),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append one initialized slot.
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.slots.push(Some(value));
    }

    /// Append `count` unwritten slots.
    pub fn reserve(&mut self, count: usize) {
        self.slots.resize(self.slots.len() + count, None);
    }

    /// Read an absolute slot index.
    #[inline]
    pub fn load(&self, index: usize) -> Result<Value> {
        match self.slots.get(index) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(RuntimeError::UninitializedSlot(index)),
            None => Err(RuntimeError::Internal(format!(
                "frame slot {} out of range",
                index
            ))),
        }
    }

    /// Write an absolute slot index.
    #[inline]
    pub fn store(&mut self, index: usize, value: Value) -> Result<()> {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(RuntimeError::Internal(format!(
                "frame slot {} out of range",
                index
            ))),
        }
    }

    /// Drop every slot at or above `len`.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_slots_start_unwritten() {
        let mut data = DataArea::new();
        data.reserve(2);
        assert_eq!(data.len(), 2);
        assert_eq!(data.load(0), Err(RuntimeError::UninitializedSlot(0)));
        data.store(0, Value::Int(7)).unwrap();
        assert_eq!(data.load(0).unwrap(), Value::Int(7));
        assert_eq!(data.load(1), Err(RuntimeError::UninitializedSlot(1)));
    }

    #[test]
    fn test_out_of_range_slots_are_internal_errors() {
        let mut data = DataArea::new();
        assert!(matches!(data.load(0), Err(RuntimeError::Internal(_))));
        assert!(matches!(
            data.store(3, Value::Unit),
            Err(RuntimeError::Internal(_))
        ));
    }

    #[test]
    fn test_truncate_discards_a_frame() {
        let mut data = DataArea::new();
        data.push(Value::Int(1));
        data.push(Value::Int(2));
        data.reserve(3);
        data.truncate(1);
        assert_eq!(data.len(), 1);
        assert_eq!(data.load(0).unwrap(), Value::Int(1));
    }
}
