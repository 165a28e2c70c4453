//! Tracing hooks for stream lifecycle events.
//!
//! Compiles to nothing without the `tracing` feature.

use bufstream_core::id::StreamId;

#[cfg(feature = "tracing")]
pub fn record(stream: StreamId, event: &'static str, size: usize) {
    tracing::trace!(%stream, event, size, "bufstream");
}

#[cfg(not(feature = "tracing"))]
pub fn record(_stream: StreamId, _event: &'static str, _size: usize) { /* no-op */
}
