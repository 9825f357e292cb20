//! Display surfaces
//!
//! A display is an upsertable, identity-keyed plain-text target. Each job
//! owns one identity and replaces the text shown under it on every update.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Identity of one rendering slot on a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayId(u64);

impl DisplayId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out display identities 1, 2, 3...
///
/// Shared between jobs through an `Arc`.
#[derive(Debug)]
pub struct DisplayIdAllocator {
    next: AtomicU64,
}

impl DisplayIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> DisplayId {
        DisplayId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DisplayIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendering target for live job output
pub trait Display: Send + Sync {
    /// Replaces the text shown under `id` with `text`
    ///
    /// Creates the slot on first use.
    fn upsert(&self, id: DisplayId, text: &str);
}

/// Display that records every render in order
///
/// Useful for embedding sbwatch where output is consumed programmatically.
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    renders: Mutex<Vec<(DisplayId, String)>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// All renders so far, oldest first
    pub fn renders(&self) -> Vec<(DisplayId, String)> {
        self.renders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent text rendered under `id`
    pub fn latest(&self, id: DisplayId) -> Option<String> {
        self.renders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(slot, _)| *slot == id)
            .map(|(_, text)| text.clone())
    }
}

impl Display for MemoryDisplay {
    fn upsert(&self, id: DisplayId, text: &str) {
        self.renders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, text.to_string()));
    }
}
