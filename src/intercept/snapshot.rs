//! Snapshot
//!
//! What an interception replaced, recorded precisely enough to undo it.

use super::target::{ReceiverId, Target};
use crate::dispatch::{Implementation, MethodEntry, Visibility};

/// Where the intercepted callable was found relative to the slot that was
/// rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOrigin {
    /// The slot held its own entry; restoring puts that entry back.
    Own,
    /// The callable resolved through a fallback (the object's class or a
    /// superclass); restoring empties the slot so resolution falls through again.
    Inherited,
}

/// The original callable plus its visibility and location.
///
/// Restoration takes the snapshot by value, so it is consumed exactly once.
#[derive(Debug)]
pub struct Snapshot {
    target: Target,
    method: String,
    original: MethodEntry,
    origin: SlotOrigin,
}

impl Snapshot {
    pub(crate) fn capture(
        target: Target,
        method: impl Into<String>,
        original: MethodEntry,
        origin: SlotOrigin,
    ) -> Self {
        Self {
            target,
            method: method.into(),
            original,
            origin,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn receiver_id(&self) -> ReceiverId {
        self.target.receiver_id()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn original(&self) -> &Implementation {
        &self.original.implementation
    }

    pub fn visibility(&self) -> Visibility {
        self.original.visibility
    }

    pub fn origin(&self) -> SlotOrigin {
        self.origin
    }

    pub(crate) fn into_parts(self) -> (Target, String, MethodEntry, SlotOrigin) {
        (self.target, self.method, self.original, self.origin)
    }
}
