//! High-water mark of accounted bytes.
//!
//! Keep this cheap; it runs on every enqueue.

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct PeakTracker {
    peak_bytes: Cell<usize>,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new accounted size; updates the peak if higher.
    pub fn record(&self, size: usize) {
        if size > self.peak_bytes.get() {
            self.peak_bytes.set(size);
            #[cfg(feature = "tracing")]
            tracing::trace!(peak = size, "queue high-water mark");
        }
    }

    pub fn peak(&self) -> usize {
        self.peak_bytes.get()
    }
}
