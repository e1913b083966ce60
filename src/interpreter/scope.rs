//! Runtime environment
//!
//! A stack of frames mapping names to store addresses. Name resolution
//! walks frames innermost first. Closures capture a flattened copy of the
//! whole chain; re-installing it later (plus a fresh parameter frame)
//! reconstructs the defining environment for a call.

use std::collections::HashMap;

use super::store::Addr;
use super::value::Captured;

type Frame = HashMap<String, Addr>;

#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    /// A scope with a single (global) frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn leave(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the global frame");
        self.frames.pop();
    }

    /// Bind a name to an address in the innermost frame.
    pub fn insert(&mut self, name: impl Into<String>, addr: Addr) {
        self.frames
            .last_mut()
            .expect("scope always has a frame")
            .insert(name.into(), addr);
    }

    /// Resolve a name, innermost frame first.
    pub fn resolve(&self, name: &str) -> Option<Addr> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .copied()
    }

    /// Flatten the whole chain into a captured environment for a closure.
    pub fn capture(&self) -> Captured {
        let mut captured = HashMap::new();
        for frame in &self.frames {
            captured.extend(frame.iter().map(|(k, v)| (k.clone(), *v)));
        }
        Captured(captured)
    }

    /// Push a captured environment as a frame (the basis of a call).
    pub fn push_captured(&mut self, captured: &Captured) {
        self.frames.push(captured.0.clone());
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
