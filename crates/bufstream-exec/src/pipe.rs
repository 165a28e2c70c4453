//! Connect a `DataSource` to a `DataSink` with backpressure.
//!
//! Data is forwarded as it is emitted. When the sink reports backpressure the
//! source is paused, and the sink's `Drain` resumes it. The source's `End`
//! closes the sink and detaches both listeners.
//!
//! The listeners hold clones of both endpoints until they are detached, so a
//! pipe whose source never ends keeps both alive until `unpipe`.

use std::cell::Cell;
use std::rc::Rc;

use bufstream_core::channel::{DataSink, DataSource, Listener, Observable, StreamEvent};
use bufstream_core::chunk::Input;
use bufstream_core::id::ListenerId;

type Slot = Rc<Cell<Option<ListenerId>>>;

/// A live source -> sink connection.
pub struct Pipe<S, D> {
    source: S,
    dest: D,
    source_listener: Slot,
    dest_listener: Slot,
}

pub fn pipe<S, D>(source: &S, dest: &D) -> Pipe<S, D>
where
    S: DataSource + Clone + 'static,
    D: DataSink + Clone + 'static,
{
    let source_slot: Slot = Rc::default();
    let dest_slot: Slot = Rc::default();

    let on_dest: Listener = {
        let source = source.clone();
        Rc::new(move |event: &StreamEvent| {
            if let StreamEvent::Drain = event {
                source.resume();
            }
        })
    };
    dest_slot.set(Some(dest.on(on_dest)));

    let on_source: Listener = {
        let source = source.clone();
        let dest = dest.clone();
        let source_slot = Rc::clone(&source_slot);
        let dest_slot = Rc::clone(&dest_slot);
        Rc::new(move |event: &StreamEvent| match event {
            StreamEvent::Data(payload) => match dest.accept(Input::from(payload.clone())) {
                Ok(true) => {}
                Ok(false) => source.pause(),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %err, "pipe sink rejected data; pausing source");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                    source.pause();
                }
            },
            StreamEvent::End => {
                detach(&source, &source_slot, &dest, &dest_slot);
                if let Err(err) = dest.close() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %err, "pipe sink already closed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                }
            }
            StreamEvent::Drain | StreamEvent::Pause | StreamEvent::Resume => {}
        })
    };
    source_slot.set(Some(source.on(on_source)));

    Pipe {
        source: source.clone(),
        dest: dest.clone(),
        source_listener: source_slot,
        dest_listener: dest_slot,
    }
}

fn detach<S: Observable, D: Observable>(
    source: &S,
    source_slot: &Slot,
    dest: &D,
    dest_slot: &Slot,
) {
    if let Some(id) = source_slot.take() {
        source.off(id);
    }
    if let Some(id) = dest_slot.take() {
        dest.off(id);
    }
}

impl<S: DataSource, D: DataSink> Pipe<S, D> {
    /// Stop forwarding. The sink is not closed.
    pub fn unpipe(&self) {
        detach(
            &self.source,
            &self.source_listener,
            &self.dest,
            &self.dest_listener,
        );
    }

    /// False once the source ended or `unpipe` ran.
    pub fn is_attached(&self) -> bool {
        self.source_listener.get().is_some()
    }
}
