//! Channel capabilities a stream can be composed against.
//!
//! Anything that emits `StreamEvent`s and can be paused is a `DataSource`;
//! anything that accepts writes and an end-of-stream is a `DataSink`. Piping
//! only needs these traits, not a concrete stream type.

use std::rc::Rc;

use crate::chunk::{Input, Payload};
use crate::error::Result;
use crate::id::ListenerId;

/// Signals observable on a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Data(Payload),
    /// Backpressure was relieved: accounted size dropped back to the limit.
    Drain,
    Pause,
    Resume,
    /// Terminal signal; emitted at most once.
    End,
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Data(_) => "data",
            StreamEvent::Drain => "drain",
            StreamEvent::Pause => "pause",
            StreamEvent::Resume => "resume",
            StreamEvent::End => "end",
        }
    }
}

/// Subscriber callback. Shared behind `Rc` so emission can run without
/// holding any borrow of the emitter, which lets listeners call back in.
pub type Listener = Rc<dyn Fn(&StreamEvent)>;

pub trait Observable {
    fn on(&self, listener: Listener) -> ListenerId;
    /// Returns false if `id` was not subscribed.
    fn off(&self, id: ListenerId) -> bool;
}

/// Produces `Data` and `End` signals; emission can be gated.
pub trait DataSource: Observable {
    fn pause(&self);
    fn resume(&self);
}

/// Accepts writes and an end-of-stream; signals `Drain` after reporting
/// backpressure.
pub trait DataSink: Observable {
    /// Returns `Ok(false)` when the producer should pause.
    fn accept(&self, data: Input) -> Result<bool>;
    fn close(&self) -> Result<()>;
}
