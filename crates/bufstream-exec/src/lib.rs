#![forbid(unsafe_code)]
//! bufstream-exec: the drain scheduler and lifecycle controller.
//!
//! `BufferedStream` queues writes and re-emits them on later event-loop turns
//! through an injected `Scheduler`. Two schedulers ship here: a deterministic
//! `ManualScheduler` for tests and embedding, and a tokio `LocalSet`-backed
//! one behind the `async-scheduler` feature. `pipe` connects any source to
//! any sink with backpressure.

pub mod metrics;
pub mod pipe;
pub mod scheduler;
pub mod stream;

pub use bufstream_core::prelude::*;
pub use bufstream_mem::Capacity;
pub use pipe::{pipe, Pipe};
pub use scheduler::ManualScheduler;
#[cfg(feature = "async-scheduler")]
pub use scheduler::TokioScheduler;
pub use stream::BufferedStream;
