//! Scheduling/dispatch queue.
//!
//! Mutation requests enqueue hosts here; the queue coalesces requests
//! per host (the `is_queued_for_update` flag is the de-duplication gate)
//! and drains on an explicit microtask-equivalent tick driven by
//! [`Runtime::flush`](crate::runtime::Runtime::flush). Updates therefore
//! never run synchronously inside the triggering mutation.
//!
//! Update passes are futures (will-hooks may suspend), executed on a
//! single-threaded `LocalPool`: independent hosts interleave at await
//! points, while each host's own pass stays non-reentrant. A hook that
//! never resolves stalls only its own host's task; the pool simply
//! reports "stalled" and the tick moves on.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt as _;

use crate::types::HostElement;

pub(crate) struct Scheduler {
    queue: RefCell<VecDeque<HostElement>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Scheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Scheduler {
            queue: RefCell::new(VecDeque::new()),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Append a host to the dispatch queue.
    ///
    /// Callers are responsible for the coalescing gate (setting
    /// `is_queued_for_update` before enqueueing); the queue itself is a
    /// plain FIFO.
    pub fn enqueue(&self, host: HostElement) {
        self.queue.borrow_mut().push_back(host);
    }

    /// Drain everything currently queued.
    pub fn take_queued(&self) -> Vec<HostElement> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Spawn an update task onto the local pool.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        if let Err(error) = self.spawner.spawn_local(future) {
            log::error!("failed to spawn update task: {error}");
        }
    }

    /// Run spawned tasks until all are complete or awaiting external
    /// wake-ups. Re-entrant task code may enqueue more hosts; the caller
    /// loops until the queue stays empty.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use std::cell::Cell;
    use std::rc::Rc;

    fn host(index: usize) -> HostElement {
        HostElement(NodeId(index))
    }

    #[test]
    fn test_fifo_order() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(host(1));
        scheduler.enqueue(host(2));
        scheduler.enqueue(host(1));

        assert_eq!(scheduler.take_queued(), vec![host(1), host(2), host(1)]);
        assert!(scheduler.queue_is_empty());
    }

    #[test]
    fn test_spawned_tasks_run_on_tick() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));
        let ran_task = Rc::clone(&ran);
        scheduler.spawn(async move {
            ran_task.set(true);
        });

        assert!(!ran.get());
        scheduler.run_until_stalled();
        assert!(ran.get());
    }

    #[test]
    fn test_stalled_task_does_not_block_tick() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));
        let ran_task = Rc::clone(&ran);

        // A future that never resolves.
        scheduler.spawn(std::future::pending());
        scheduler.spawn(async move {
            ran_task.set(true);
        });

        scheduler.run_until_stalled();
        assert!(ran.get());
    }
}
