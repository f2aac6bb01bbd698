//! Cooperative single-thread scheduling.
//!
//! The engine never blocks: "waiting" for a backing confirmation is a pending
//! flag observed on a later tick. Everything it needs from the surrounding
//! event loop is captured by [`Scheduler`]; [`ManualExecutor`] is a
//! deterministic virtual-time implementation used by tests and by embedders
//! that pump the loop themselves.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

pub type Task = Box<dyn FnOnce()>;

/// The UI-thread scheduler consumed by the engine.
pub trait Scheduler {
    /// Run `task` as soon as possible, after already-queued work.
    fn execute(&self, task: Task);

    /// Run `task` once `delay` has elapsed.
    fn execute_after(&self, delay: Duration, task: Task);
}

struct TimerEntry {
    due: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

#[derive(Default)]
struct ExecutorState {
    now: Duration,
    seq: u64,
    ready: VecDeque<Task>,
    timers: BinaryHeap<Reverse<TimerEntry>>,
}

/// Deterministic scheduler over a virtual clock.
///
/// Tasks run only inside [`ManualExecutor::run_until_idle`] or
/// [`ManualExecutor::advance`], in submission order; timers fire in due-time
/// order with FIFO tie-breaking.
#[derive(Default)]
pub struct ManualExecutor {
    state: RefCell<ExecutorState>,
}

impl ManualExecutor {
    pub fn new() -> Rc<Self> { Rc::new(Self::default()) }

    pub fn now(&self) -> Duration { self.state.borrow().now }

    pub fn pending(&self) -> usize {
        let state = self.state.borrow();
        state.ready.len() + state.timers.len()
    }

    /// Runs every ready task, including tasks enqueued while running, until
    /// the ready queue is empty. Timers already due at the current virtual
    /// time are promoted first. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            self.promote_due_timers();
            let task = self.state.borrow_mut().ready.pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Advances the virtual clock by `delta`, running ready tasks and every
    /// timer that comes due along the way. Returns the number of tasks run.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.state.borrow().now + delta;
        let mut ran = self.run_until_idle();
        loop {
            let next_due = {
                let state = self.state.borrow();
                state.timers.peek().map(|Reverse(entry)| entry.due)
            };
            match next_due {
                Some(due) if due <= target => {
                    self.state.borrow_mut().now = due;
                    ran += self.run_until_idle();
                }
                _ => break,
            }
        }
        self.state.borrow_mut().now = target;
        ran
    }

    fn promote_due_timers(&self) {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        while let Some(Reverse(entry)) = state.timers.peek() {
            if entry.due > now {
                break;
            }
            let Reverse(entry) = state.timers.pop().unwrap();
            state.ready.push_back(entry.task);
        }
    }
}

impl Scheduler for ManualExecutor {
    fn execute(&self, task: Task) { self.state.borrow_mut().ready.push_back(task); }

    fn execute_after(&self, delay: Duration, task: Task) {
        let mut state = self.state.borrow_mut();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.timers.push(Reverse(TimerEntry { due, seq, task }));
    }
}
