//! Advisory capacity and the full/not-full edge detector.
//!
//! The gate never refuses data. It answers "should the producer pause?" and
//! remembers whether it has said yes, so the drain loop can announce the
//! moment the answer flips back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Capacity {
    #[default]
    Unlimited,
    Limited(usize),
}

impl Capacity {
    /// Negative limits mean unlimited.
    pub fn from_signed(limit: i64) -> Self {
        match usize::try_from(limit) {
            Ok(v) => Capacity::Limited(v),
            Err(_) => Capacity::Unlimited,
        }
    }

    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Unlimited => None,
            Capacity::Limited(v) => Some(v),
        }
    }

    /// `size` is strictly over the limit.
    pub fn exceeded_by(self, size: usize) -> bool {
        match self {
            Capacity::Unlimited => false,
            Capacity::Limited(max) => size > max,
        }
    }
}

impl From<Option<usize>> for Capacity {
    fn from(limit: Option<usize>) -> Self {
        limit.map_or(Capacity::Unlimited, Capacity::Limited)
    }
}

#[derive(Debug, Default)]
pub struct BackpressureGate {
    capacity: Capacity,
    was_full: bool,
}

impl BackpressureGate {
    pub fn new(capacity: Capacity) -> Self {
        Self {
            capacity,
            was_full: false,
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn is_full(&self, size: usize) -> bool {
        self.capacity.exceeded_by(size)
    }

    /// Called after an enqueue. Returns whether the producer may keep going;
    /// a `false` answer is remembered until `take_drain_edge` observes relief.
    pub fn admit(&mut self, size: usize) -> bool {
        if self.is_full(size) {
            self.was_full = true;
            false
        } else {
            true
        }
    }

    /// True exactly once per full -> not-full transition.
    pub fn take_drain_edge(&mut self, size: usize) -> bool {
        if self.was_full && !self.is_full(size) {
            self.was_full = false;
            true
        } else {
            false
        }
    }

    pub fn was_full(&self) -> bool {
        self.was_full
    }
}
