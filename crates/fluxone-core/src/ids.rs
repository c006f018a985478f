//! Store instance id allocation.
//!
//! Ids start at 1 and are never reused within one allocator. Stores built
//! without an explicit allocator draw from [`InstanceIds::global`].

use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL: InstanceIds = InstanceIds::new();

/// Monotonic id allocator.
#[derive(Debug, Default)]
pub struct InstanceIds {
    last: AtomicU64,
}

impl InstanceIds {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Process-wide allocator.
    #[must_use]
    pub fn global() -> &'static InstanceIds {
        &GLOBAL
    }

    /// Allocate the next id.
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last id handed out, 0 if none.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Start over from 1.
    pub fn reset(&self) {
        self.last.store(0, Ordering::SeqCst);
    }
}
