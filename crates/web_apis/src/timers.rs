//! Cooperative task queue with timers (setTimeout).
//!
//! Tasks run one at a time on the thread that drives the queue, against a
//! context owned by the caller. Time is virtual: it only moves when the driver
//! calls [`TaskQueue::advance`].

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// A unit of work run against the queue's context.
pub type Task<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Hooks the queue calls between tasks.
pub trait EventLoopContext {
    /// Runs after every task (mutation observer delivery and the like).
    fn perform_microtask_checkpoint(&mut self) {}
}

struct Timer<C> {
    due_ms: u64,
    seq: u64,
    label: &'static str,
    task: Task<C>,
}

struct Shared<C> {
    timers: Vec<Timer<C>>,
    next_seq: u64,
    now_ms: u64,
}

impl<C> Shared<C> {
    fn push(&mut self, delay_ms: u64, label: &'static str, task: Task<C>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            label,
            task,
        });
    }

    /// Remove the earliest timer due at or before `until_ms`.
    fn pop_due(&mut self, until_ms: u64) -> Option<Timer<C>> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(i, _)| i)?;
        let timer = self.timers.swap_remove(index);
        self.now_ms = self.now_ms.max(timer.due_ms);
        Some(timer)
    }
}

/// Posts tasks to a [`TaskQueue`] from anywhere, including other threads.
pub struct TaskSender<C> {
    shared: Arc<Mutex<Shared<C>>>,
}

impl<C> Clone for TaskSender<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C> TaskSender<C> {
    /// Queue a task to run as soon as the queue is driven.
    pub fn post<F>(&self, label: &'static str, task: F)
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.post_delayed(label, 0, task);
    }

    /// Queue a task to run once `delay_ms` of queue time has passed.
    pub fn post_delayed<F>(&self, label: &'static str, delay_ms: u64, task: F)
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        trace!(label, delay_ms, "task posted");
        self.shared.lock().push(delay_ms, label, Box::new(task));
    }
}

/// Single-threaded task queue with a virtual millisecond clock.
pub struct TaskQueue<C> {
    shared: Arc<Mutex<Shared<C>>>,
}

impl<C: EventLoopContext> TaskQueue<C> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                timers: Vec::new(),
                next_seq: 0,
                now_ms: 0,
            })),
        }
    }

    /// A handle for posting tasks.
    pub fn sender(&self) -> TaskSender<C> {
        TaskSender {
            shared: self.shared.clone(),
        }
    }

    /// Current queue time.
    pub fn now_ms(&self) -> u64 {
        self.shared.lock().now_ms
    }

    /// Number of queued tasks, due or not.
    pub fn pending(&self) -> usize {
        self.shared.lock().timers.len()
    }

    /// When the next task becomes due.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.shared.lock().timers.iter().map(|t| t.due_ms).min()
    }

    /// Run every task that is due now, including tasks they post with no delay.
    pub fn run_until_idle(&self, context: &mut C) -> usize {
        let now = self.now_ms();
        self.run_until(context, now)
    }

    /// Move the clock forward, running each timer at its due time in order.
    pub fn advance(&self, context: &mut C, by_ms: u64) -> usize {
        let target = self.now_ms().saturating_add(by_ms);
        let ran = self.run_until(context, target);
        self.shared.lock().now_ms = target;
        ran
    }

    fn run_until(&self, context: &mut C, until_ms: u64) -> usize {
        let mut ran = 0;
        loop {
            // The lock is released before the task runs so it can post more tasks.
            let next = self.shared.lock().pop_due(until_ms);
            let Some(timer) = next else {
                break;
            };
            trace!(label = timer.label, due_ms = timer.due_ms, "running task");
            (timer.task)(context);
            context.perform_microtask_checkpoint();
            ran += 1;
        }
        ran
    }
}

impl<C: EventLoopContext> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
