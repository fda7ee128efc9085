//! Match id allocation strategies: a local counter, or a sequence shared
//! across a whole system so game ids stay globally addressable.

use crate::models::MatchId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Assigns unique ids to the fixtures a cup creates. A cup is configured
/// with one allocator at construction and uses it for every fixture,
/// including playoff fixtures generated later.
pub trait MatchIdAllocator {
    fn allocate(&mut self) -> MatchId;
}

/// Locally owned monotonically increasing counter, starting at 1.
/// The default for standalone cups and tests.
#[derive(Clone, Debug)]
pub struct SequentialAllocator {
    next: MatchId,
}

impl SequentialAllocator {
    /// Counter starting at an arbitrary first id.
    pub fn starting_at(first: MatchId) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl MatchIdAllocator for SequentialAllocator {
    fn allocate(&mut self) -> MatchId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// A sequence shared by any number of cups: clone the allocator and hand one
/// copy to each cup, and every fixture in the system gets a distinct id.
#[derive(Clone, Debug)]
pub struct SharedAllocator {
    next: Arc<AtomicU64>,
}

impl SharedAllocator {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SharedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchIdAllocator for SharedAllocator {
    fn allocate(&mut self) -> MatchId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
