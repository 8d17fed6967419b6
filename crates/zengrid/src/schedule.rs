//! Deferred task scheduling.
//!
//! Pipeline work is synchronous. The only deferred work is toolbar discovery
//! retries and the toolbar option announcement after pairing, which wait a
//! short fixed delay for late elements to appear. Hosts supply a
//! [`Scheduler`]: the browser binding backs it with `setTimeout`, native hosts
//! and tests use [`ManualScheduler`].

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use tracing::trace;

/// Delay before the single discovery retry.
pub const DISCOVERY_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Delay before a freshly paired grid announces its toolbar options.
pub const ANNOUNCE_DELAY: Duration = Duration::ZERO;

/// A deferred unit of work. There is no cancellation handle.
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks later, after at least `delay`.
pub trait Scheduler {
    fn defer(&self, delay: Duration, task: Task);
}

/// Queue of deferred tasks drained explicitly by the owner.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<Vec<(Duration, Task)>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Delays of the queued tasks, in queue order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.queue.borrow().iter().map(|(delay, _)| *delay).collect()
    }

    /// Runs every task queued so far, shortest delay first.
    ///
    /// Tasks deferred while running stay queued for the next call. Returns
    /// the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.queue.borrow_mut());
        tasks.sort_by_key(|(delay, _)| *delay);
        let count = tasks.len();
        for (delay, task) in tasks {
            trace!(schedule.delay = ?delay, "Running deferred task");
            task();
        }
        count
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, delay: Duration, task: Task) {
        self.queue.borrow_mut().push((delay, task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn runs_shortest_delay_first() {
        let scheduler = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let late = Rc::clone(&order);
        let early = Rc::clone(&order);
        scheduler.defer(DISCOVERY_RETRY_DELAY, Box::new(move || late.borrow_mut().push("retry")));
        scheduler.defer(ANNOUNCE_DELAY, Box::new(move || early.borrow_mut().push("announce")));

        assert_eq!(scheduler.delays(), vec![DISCOVERY_RETRY_DELAY, ANNOUNCE_DELAY]);
        assert_eq!(scheduler.run_pending(), 2);
        assert_eq!(*order.borrow(), vec!["announce", "retry"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn tasks_deferred_while_running_wait() {
        let scheduler = Rc::new(ManualScheduler::new());
        let ran = Rc::new(Cell::new(0));
        let inner_sched = Rc::clone(&scheduler);
        let inner_ran = Rc::clone(&ran);
        scheduler.defer(
            Duration::ZERO,
            Box::new(move || {
                let counter = Rc::clone(&inner_ran);
                inner_sched.defer(Duration::ZERO, Box::new(move || counter.set(counter.get() + 1)));
            }),
        );

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(ran.get(), 0);
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(ran.get(), 1);
    }
}
