//! Scheduler implementations for the deferred drain and finalize steps.
//!
//! `ManualScheduler` is always available: a FIFO of tasks advanced one turn
//! at a time by the caller. `TokioScheduler` needs the `async-scheduler`
//! feature and a running `tokio::task::LocalSet`.

pub use manual_impl::*;

#[cfg(feature = "async-scheduler")]
pub use async_impl::*;

mod manual_impl {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use bufstream_core::schedule::{Scheduler, Task};

    /// Deterministic event loop. A turn runs the tasks that were queued when
    /// it started; tasks deferred while it runs wait for the next turn, so a
    /// self-rescheduling task advances exactly once per turn.
    #[derive(Default)]
    pub struct ManualScheduler {
        q: RefCell<VecDeque<Task>>,
        turns: Cell<u64>,
        executed: Cell<u64>,
    }

    impl ManualScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        /// Tasks waiting for a turn.
        pub fn pending(&self) -> usize {
            self.q.borrow().len()
        }

        pub fn is_idle(&self) -> bool {
            self.q.borrow().is_empty()
        }

        /// Turns that ran at least one task.
        pub fn turns(&self) -> u64 {
            self.turns.get()
        }

        /// Tasks run so far.
        pub fn executed(&self) -> u64 {
            self.executed.get()
        }

        /// Run one turn. Returns the number of tasks it ran.
        pub fn run_turn(&self) -> usize {
            let batch: Vec<Task> = self.q.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return 0;
            }
            self.turns.set(self.turns.get() + 1);
            let n = batch.len();
            for task in batch {
                task();
                self.executed.set(self.executed.get() + 1);
            }
            n
        }

        /// Run turns until no task is pending or `max_turns` is reached.
        /// Returns the number of turns run.
        pub fn run_until_idle(&self, max_turns: usize) -> usize {
            let mut ran = 0;
            while ran < max_turns && !self.is_idle() {
                self.run_turn();
                ran += 1;
            }
            ran
        }
    }

    impl Scheduler for ManualScheduler {
        fn defer(&self, task: Task) {
            self.q.borrow_mut().push_back(task);
        }
    }
}

#[cfg(feature = "async-scheduler")]
mod async_impl {
    use bufstream_core::schedule::{Scheduler, Task};

    /// Defers onto the current `LocalSet` with `spawn_local`.
    ///
    /// Panics (inside tokio) when used outside a `LocalSet`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct TokioScheduler;

    impl Scheduler for TokioScheduler {
        fn defer(&self, task: Task) {
            // Detached: the join handle is not needed.
            drop(tokio::task::spawn_local(async move { task() }));
        }
    }
}
