//! Opaque element handles.

use serde::{Deserialize, Serialize};

/// A value-typed reference to a node in the OS accessibility tree.
///
/// Two handles are equal iff they name the same OS node. The underlying OS
/// reference is reference-counted, so handles are cheap to copy and may be
/// shared across threads. Any operation taking a handle may fail with
/// `InvalidElement` at any time: the OS retires nodes asynchronously, and
/// that failure is a recoverable condition, not a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element(u64);

impl Element {
    pub fn from_raw(raw: u64) -> Self {
        Element(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<element {}>", self.0)
    }
}
