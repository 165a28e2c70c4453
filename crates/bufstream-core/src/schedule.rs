//! Deferred-task scheduling interface.
//!
//! The buffering core never waits; it asks a `Scheduler` to run a closure on
//! a later event-loop turn and returns. Concrete schedulers live in
//! `bufstream-exec`. Everything here is single-threaded: tasks are not `Send`.

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + 'static>;

/// "Run this closure later, before the next I/O cycle."
///
/// Implementations must never run the task synchronously inside `defer`;
/// the drain loop relies on `defer` returning before the task executes.
pub trait Scheduler {
    fn defer(&self, task: Task);
}

impl<F> Scheduler for F
where
    F: Fn(Task),
{
    fn defer(&self, task: Task) {
        self(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn closures_act_as_schedulers() {
        let parked: Rc<RefCell<Vec<Task>>> = Rc::default();
        let sink = Rc::clone(&parked);
        let scheduler = move |task: Task| sink.borrow_mut().push(task);

        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        scheduler.defer(Box::new(move || *flag.borrow_mut() = true));
        assert!(!*ran.borrow());

        let task = parked.borrow_mut().pop().unwrap();
        task();
        assert!(*ran.borrow());
    }
}
