//! `BufferedStream`: queue writes now, emit them on later turns.
//!
//! Two cooperative chains run on the injected scheduler:
//!
//! - the drain chain emits queued chunks, one bounded pass per turn, and
//!   stops as soon as the queue is empty or the stream is paused;
//! - the finalize chain, armed by `end`, waits for the queue to empty and
//!   then destroys the stream and emits `End` once.
//!
//! Each chain is guarded by a flag (`draining`, `finalizing`) so at most one
//! step of each kind is ever pending. A paused stream has no pending steps;
//! `resume` re-arms whichever chains still have work.
//!
//! Listeners are invoked with no borrow of the stream state held, so they may
//! write, pause, resume, end or destroy from inside a callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bufstream_core::channel::{DataSink, DataSource, Listener, Observable, StreamEvent};
use bufstream_core::chunk::{Input, Payload};
use bufstream_core::config::StreamConfig;
use bufstream_core::encoding::{Encoding, TextDecoder};
use bufstream_core::error::{Error, Result};
use bufstream_core::id::{ListenerId, StreamId};
use bufstream_core::schedule::Scheduler;
use bufstream_mem::{BackpressureGate, Capacity, ChunkQueue, PeakTracker};

use crate::metrics;
use crate::pipe::pipe;

/// Handle to a buffered stream. Clones share the same stream.
#[derive(Clone)]
pub struct BufferedStream {
    inner: Rc<Inner>,
}

struct Inner {
    id: StreamId,
    scheduler: Rc<dyn Scheduler>,
    state: RefCell<State>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    peak: PeakTracker,
}

struct State {
    queue: ChunkQueue,
    gate: BackpressureGate,
    /// Text mode; `None` emits raw chunks.
    decoder: Option<TextDecoder>,
    max_chunks_per_turn: Option<usize>,
    readable: bool,
    writable: bool,
    ended: bool,
    paused: bool,
    /// A drain step is pending or running.
    draining: bool,
    /// A finalize step is pending or running.
    finalizing: bool,
    /// `End` has been emitted.
    terminated: bool,
}

impl State {
    /// Drop queued data and close both sides. Returns the bytes discarded.
    fn teardown(&mut self) -> usize {
        self.readable = false;
        self.writable = false;
        self.queue.clear()
    }
}

enum FinalizeStep {
    /// Carries decoded text still buffered in the decoder, if any.
    Terminate(Option<Payload>),
    Again,
    Dormant,
}

impl BufferedStream {
    /// Unlimited capacity, raw byte output.
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_config(scheduler, StreamConfig::default())
    }

    pub fn with_capacity(scheduler: Rc<dyn Scheduler>, capacity: Capacity) -> Self {
        Self::with_config(
            scheduler,
            StreamConfig {
                max_size: capacity.limit(),
                ..StreamConfig::default()
            },
        )
    }

    pub fn with_config(scheduler: Rc<dyn Scheduler>, cfg: StreamConfig) -> Self {
        let id = StreamId::next();
        metrics::record(id, "open", 0);
        Self {
            inner: Rc::new(Inner {
                id,
                scheduler,
                state: RefCell::new(State {
                    queue: ChunkQueue::new(),
                    gate: BackpressureGate::new(Capacity::from(cfg.max_size)),
                    decoder: cfg.encoding.map(TextDecoder::new),
                    max_chunks_per_turn: cfg.max_chunks_per_turn.map(|n| n.max(1)),
                    readable: true,
                    writable: true,
                    ended: false,
                    paused: false,
                    draining: false,
                    finalizing: false,
                    terminated: false,
                }),
                listeners: RefCell::new(Vec::new()),
                peak: PeakTracker::new(),
            }),
        }
    }

    /// A stream that already holds its whole content: `payload` is written
    /// and the stream ended in one step.
    pub fn from_payload(
        scheduler: Rc<dyn Scheduler>,
        cfg: StreamConfig,
        payload: impl Into<Input>,
    ) -> Result<Self> {
        let stream = Self::with_config(scheduler, cfg);
        stream.end_with(payload)?;
        Ok(stream)
    }

    /// A stream fed by `source`: its data is written here and its end ends
    /// this stream. The source is paused while this stream reports
    /// backpressure.
    ///
    /// The link is permanent: it is released only when `source` emits `End`.
    /// Use `with_config` plus `pipe` to keep a `Pipe` handle that can
    /// `unpipe` early.
    pub fn from_source<S>(scheduler: Rc<dyn Scheduler>, cfg: StreamConfig, source: &S) -> Self
    where
        S: DataSource + Clone + 'static,
    {
        let stream = Self::with_config(scheduler, cfg);
        pipe(source, &stream);
        stream
    }

    pub fn id(&self) -> StreamId {
        self.inner.id
    }

    /// Queue `data` for emission. Returns `Ok(false)` when the stream is now
    /// over capacity and the producer should pause until `Drain`.
    pub fn write(&self, data: impl Into<Input>) -> Result<bool> {
        self.inner.write(data.into())
    }

    /// End the stream. `End` is emitted once everything queued has been
    /// delivered.
    pub fn end(&self) -> Result<()> {
        self.inner.end(None)
    }

    /// Write a final chunk, then end.
    pub fn end_with(&self, data: impl Into<Input>) -> Result<()> {
        self.inner.end(Some(data.into()))
    }

    /// Stop emitting. Writes are still accepted and queued.
    pub fn pause(&self) {
        self.inner.pause();
    }

    pub fn resume(&self) {
        self.inner.resume();
    }

    /// Switch text mode on (`Some`) or off. Affects chunks emitted from now
    /// on; bytes of a partial character held by the previous decoder are
    /// discarded.
    pub fn set_encoding(&self, encoding: Option<Encoding>) {
        self.inner.state.borrow_mut().decoder = encoding.map(TextDecoder::new);
    }

    /// Emit everything queued right now, ignoring the per-turn bound.
    ///
    /// Stops early if a listener pauses or destroys the stream. The whole
    /// queue is delivered before this returns, so on a very large queue it
    /// does unbounded work in one call; the scheduled drain exists to avoid
    /// exactly that.
    pub fn flush(&self) {
        self.inner.drain_pass(usize::MAX);
    }

    /// Tear the stream down immediately: queued data is dropped and the
    /// stream becomes neither readable nor writable. Emits nothing; an `End`
    /// already pending from `end` is still delivered.
    pub fn destroy(&self) {
        let mut st = self.inner.state.borrow_mut();
        if !st.readable && !st.writable {
            return;
        }
        let dropped = st.teardown();
        #[cfg(feature = "tracing")]
        tracing::debug!(stream = %self.inner.id, dropped, "destroyed");
        #[cfg(not(feature = "tracing"))]
        let _ = dropped;
    }

    /// Subscribe a closure to every event this stream emits.
    pub fn subscribe(&self, listener: impl Fn(&StreamEvent) + 'static) -> ListenerId {
        self.inner.add_listener(Rc::new(listener))
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.remove_listener(id)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        let st = self.inner.state.borrow();
        st.gate.is_full(st.queue.size())
    }

    /// Bytes queued and not yet emitted.
    pub fn size(&self) -> usize {
        self.inner.state.borrow().queue.size()
    }

    /// Largest `size` ever observed.
    pub fn peak_size(&self) -> usize {
        self.inner.peak.peak()
    }

    pub fn capacity(&self) -> Capacity {
        self.inner.state.borrow().gate.capacity()
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.inner
            .state
            .borrow()
            .decoder
            .as_ref()
            .map(TextDecoder::encoding)
    }

    pub fn is_ended(&self) -> bool {
        self.inner.state.borrow().ended
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.borrow().paused
    }

    pub fn is_readable(&self) -> bool {
        self.inner.state.borrow().readable
    }

    pub fn is_writable(&self) -> bool {
        self.inner.state.borrow().writable
    }
}

impl fmt::Debug for BufferedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.state.borrow();
        f.debug_struct("BufferedStream")
            .field("id", &self.inner.id)
            .field("size", &st.queue.size())
            .field("chunks", &st.queue.len())
            .field("capacity", &st.gate.capacity())
            .field("readable", &st.readable)
            .field("writable", &st.writable)
            .field("ended", &st.ended)
            .field("paused", &st.paused)
            .finish()
    }
}

impl Inner {
    fn write(self: &Rc<Self>, data: Input) -> Result<bool> {
        {
            let st = self.state.borrow();
            if !st.writable {
                return Err(Error::NotWritable);
            }
            if st.ended {
                return Err(Error::AlreadyEnded);
            }
        }
        let chunk = data.into_chunk()?;

        let (admitted, start) = {
            let mut st = self.state.borrow_mut();
            st.queue.enqueue(chunk);
            let size = st.queue.size();
            self.peak.record(size);
            let admitted = st.gate.admit(size);
            let start = !st.draining && !st.paused;
            if start {
                st.draining = true;
            }
            (admitted, start)
        };
        if start {
            self.schedule_drain();
        }
        Ok(admitted)
    }

    fn end(self: &Rc<Self>, data: Option<Input>) -> Result<()> {
        {
            let st = self.state.borrow();
            if st.ended {
                return Err(Error::AlreadyEnded);
            }
            if !st.writable {
                return Err(Error::NotWritable);
            }
        }
        if let Some(data) = data {
            self.write(data)?;
        }

        let start = {
            let mut st = self.state.borrow_mut();
            st.ended = true;
            let start = !st.finalizing && !st.paused;
            if start {
                st.finalizing = true;
            }
            metrics::record(self.id, "ending", st.queue.size());
            start
        };
        if start {
            self.schedule_finalize();
        }
        Ok(())
    }

    fn pause(&self) {
        let announce = {
            let mut st = self.state.borrow_mut();
            st.paused = true;
            st.readable
        };
        if announce {
            self.emit(&StreamEvent::Pause);
        }
    }

    fn resume(self: &Rc<Self>) {
        let (announce, drain, finalize) = {
            let mut st = self.state.borrow_mut();
            st.paused = false;
            let drain = !st.draining && st.readable && !st.queue.is_empty();
            if drain {
                st.draining = true;
            }
            // A destroyed stream only finishes an `End` whose step is already
            // pending; a dormant finalize chain stays dormant.
            let finalize = st.ended && !st.terminated && !st.finalizing && st.readable;
            if finalize {
                st.finalizing = true;
            }
            (st.readable, drain, finalize)
        };
        if announce {
            self.emit(&StreamEvent::Resume);
        }
        if drain {
            self.schedule_drain();
        }
        if finalize {
            self.schedule_finalize();
        }
    }

    fn schedule_drain(self: &Rc<Self>) {
        let this = Rc::clone(self);
        self.scheduler.defer(Box::new(move || this.drain_step()));
    }

    fn schedule_finalize(self: &Rc<Self>) {
        let this = Rc::clone(self);
        self.scheduler.defer(Box::new(move || this.finalize_step()));
    }

    /// One turn of the drain chain.
    fn drain_step(self: &Rc<Self>) {
        let budget = {
            let st = self.state.borrow();
            st.max_chunks_per_turn.unwrap_or_else(|| st.queue.len())
        };
        self.drain_pass(budget);

        let (again, size) = {
            let mut st = self.state.borrow_mut();
            let again = st.readable && !st.paused && !st.queue.is_empty();
            st.draining = again;
            (again, st.queue.size())
        };
        if again {
            self.schedule_drain();
        } else {
            metrics::record(self.id, "drain-idle", size);
        }
    }

    /// Emit up to `budget` chunks in FIFO order, then announce relief if this
    /// pass took the stream from full to not full.
    fn drain_pass(&self, budget: usize) {
        let mut emitted = 0;
        while emitted < budget {
            let payload = {
                let mut st = self.state.borrow_mut();
                if st.paused || !st.readable {
                    break;
                }
                let Some(chunk) = st.queue.dequeue() else {
                    break;
                };
                match st.decoder.as_mut() {
                    Some(decoder) => Payload::Text {
                        text: decoder.decode(&chunk),
                        encoding: decoder.encoding(),
                    },
                    None => Payload::Bytes(chunk),
                }
            };
            emitted += 1;
            self.emit(&StreamEvent::Data(payload));
        }

        let relieved = {
            let mut st = self.state.borrow_mut();
            let size = st.queue.size();
            st.readable && st.gate.take_drain_edge(size)
        };
        if relieved {
            metrics::record(self.id, "drain", self.state.borrow().queue.size());
            self.emit(&StreamEvent::Drain);
        }
    }

    /// One turn of the finalize chain.
    fn finalize_step(self: &Rc<Self>) {
        let step = {
            let mut st = self.state.borrow_mut();
            if st.terminated || st.paused {
                st.finalizing = false;
                FinalizeStep::Dormant
            } else if st.queue.is_empty() {
                st.finalizing = false;
                st.terminated = true;
                let tail = st.decoder.as_mut().and_then(|decoder| {
                    let text = decoder.finish();
                    (!text.is_empty()).then(|| Payload::Text {
                        text,
                        encoding: decoder.encoding(),
                    })
                });
                st.teardown();
                FinalizeStep::Terminate(tail)
            } else {
                FinalizeStep::Again
            }
        };
        match step {
            FinalizeStep::Terminate(tail) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(stream = %self.id, peak = self.peak.peak(), "ended");
                if let Some(tail) = tail {
                    self.emit(&StreamEvent::Data(tail));
                }
                self.emit(&StreamEvent::End);
            }
            FinalizeStep::Again => self.schedule_finalize(),
            FinalizeStep::Dormant => metrics::record(self.id, "finalize-dormant", 0),
        }
    }

    fn emit(&self, event: &StreamEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }
}

impl Observable for BufferedStream {
    fn on(&self, listener: Listener) -> ListenerId {
        self.inner.add_listener(listener)
    }

    fn off(&self, id: ListenerId) -> bool {
        self.inner.remove_listener(id)
    }
}

impl DataSource for BufferedStream {
    fn pause(&self) {
        BufferedStream::pause(self);
    }

    fn resume(&self) {
        BufferedStream::resume(self);
    }
}

impl DataSink for BufferedStream {
    fn accept(&self, data: Input) -> Result<bool> {
        self.write(data)
    }

    fn close(&self) -> Result<()> {
        self.end()
    }
}
