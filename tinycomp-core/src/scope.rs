//! Lexical scopes for one function body.
//!
//! Frames map names to local slots; the slot list itself is shared by all
//! frames of the function and only ever grows, so a slot id stays unique
//! after the block that declared it has closed.

use std::collections::HashMap;

use crate::hir::{LocalId, LocalSlot};
use crate::types::Type;

#[derive(Debug, Default)]
struct Frame {
    names: HashMap<String, LocalId>,
    declared: Vec<LocalId>,
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    slots: Vec<LocalSlot>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack::default()
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Close the innermost frame and return the slots it declared.
    pub fn pop(&mut self) -> Vec<LocalId> {
        self.frames
            .pop()
            .map(|frame| frame.declared)
            .unwrap_or_default()
    }

    /// Declare `name` in the innermost frame. Returns `None` if the frame
    /// already has a local of that name; outer frames may be shadowed.
    pub fn declare(&mut self, name: &str, ty: Type) -> Option<LocalId> {
        let id = self.slots.len();
        let frame = self.frames.last_mut()?;
        if frame.names.contains_key(name) {
            return None;
        }
        frame.names.insert(name.to_string(), id);
        frame.declared.push(id);
        self.slots.push(LocalSlot {
            name: name.to_string(),
            ty,
        });
        Some(id)
    }

    /// Innermost local named `name`.
    pub fn lookup(&self, name: &str) -> Option<LocalId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.names.get(name).copied())
    }

    pub fn slot(&self, id: LocalId) -> &LocalSlot {
        &self.slots[id]
    }

    pub fn into_slots(self) -> Vec<LocalSlot> {
        self.slots
    }
}
