// tern-vm - Peephole optimizer
// Copyright (c) 2025 The Tern Authors. MIT licensed.

//! Store/load fusion over the instruction stream.
//!
//! Two local rewrites, applied in one left-to-right pass with a single
//! instruction of lookback:
//!
//! * a store immediately followed by a load of the same slot duplicates the
//!   value instead of re-reading it: `Store i, Load i` becomes `Dup, Store i`
//! * a load immediately followed by a store to the same slot is a round trip
//!   that moves nothing and is deleted outright
//!
//! Both require exact adjacency. A label or control transfer between the two
//! instructions defeats the match, so a rewrite never spans a basic-block
//! boundary.

use crate::code::LineInfo;
use crate::ir::Ir;

/// Rewrite redundant slot traffic in a translated stream.
pub fn optimize(stream: Vec<(Ir, LineInfo)>) -> Vec<(Ir, LineInfo)> {
    let mut out: Vec<(Ir, LineInfo)> = Vec::with_capacity(stream.len());
    for (ir, line) in stream {
        match fusion(&ir, out.last().map(|(op, _)| op)) {
            Fusion::DupStore => {
                // Drop the incoming load and keep a copy on the stack
                // instead of reading the slot back.
                if let Some((store, store_line)) = out.pop() {
                    out.push((Ir::Dup, store_line));
                    out.push((store, store_line));
                }
            }
            Fusion::DropPair => {
                out.pop();
            }
            Fusion::None => out.push((ir, line)),
        }
    }
    out
}

enum Fusion {
    /// `Store i, Load i` adjacency: rewrite to `Dup, Store i`.
    DupStore,
    /// `Load i, Store i` adjacency: delete both.
    DropPair,
    None,
}

fn fusion(incoming: &Ir, previous: Option<&Ir>) -> Fusion {
    match (incoming, previous) {
        (Ir::LoadLocal { slot, .. }, Some(Ir::StoreLocal { slot: stored, .. }))
        | (Ir::LoadGlobal { slot, .. }, Some(Ir::StoreGlobal { slot: stored, .. }))
            if slot == stored =>
        {
            Fusion::DupStore
        }
        (Ir::StoreLocal { slot, .. }, Some(Ir::LoadLocal { slot: loaded, .. }))
        | (Ir::StoreGlobal { slot, .. }, Some(Ir::LoadGlobal { slot: loaded, .. }))
            if slot == loaded =>
        {
            Fusion::DropPair
        }
        _ => Fusion::None,
    }
}
