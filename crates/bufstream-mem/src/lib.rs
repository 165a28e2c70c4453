#![forbid(unsafe_code)]
//! bufstream-mem: queue accounting and the advisory capacity gate.
//!
//! Nothing here schedules or emits. `ChunkQueue` owns pending chunks and keeps
//! their byte total; `BackpressureGate` derives `full` from that total. The
//! drain state machine in `bufstream-exec` is the only caller.

pub mod gate;
pub mod queue;
pub mod tracking;

pub use gate::{BackpressureGate, Capacity};
pub use queue::ChunkQueue;
pub use tracking::PeakTracker;
