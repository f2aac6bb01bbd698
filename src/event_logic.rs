//! The window event logic drives client delivery for every live host.
//!
//! Each pass snapshots the working set and schedules one drain unit per
//! host, so firing may freely mutate the set and one failing host cannot
//! stall its siblings. The process owns no host state of its own; it is
//! rescheduled through the UI-thread scheduler while the set is non-empty.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error};

use crate::host::WindowHost;
use crate::host::wrapper::panic_message;
use crate::sys::backing::HostId;
use crate::sys::executor::Scheduler;

pub struct EventLogicProcess {
    scheduler: Rc<dyn Scheduler>,
    period: Duration,
    weak_self: std::rc::Weak<EventLogicProcess>,
    hosts: RefCell<Vec<Rc<WindowHost>>>,
    running: Cell<bool>,
    /// Stale reschedule closures from a stopped run carry an old generation
    /// and expire instead of resurrecting the loop.
    generation: Cell<u64>,
}

impl EventLogicProcess {
    pub fn new(scheduler: Rc<dyn Scheduler>, period: Duration) -> Rc<EventLogicProcess> {
        Rc::new_cyclic(|weak| EventLogicProcess {
            scheduler,
            period,
            weak_self: weak.clone(),
            hosts: RefCell::new(Vec::new()),
            running: Cell::new(false),
            generation: Cell::new(0),
        })
    }

    pub fn is_running(&self) -> bool { self.running.get() }

    pub fn host_count(&self) -> usize { self.hosts.borrow().len() }

    pub(crate) fn register(&self, host: Rc<WindowHost>) { self.hosts.borrow_mut().push(host); }

    /// Removes a host whose CLOSED event is about to fire. The host must be
    /// present; anything else is an engine bug.
    pub(crate) fn unregister(&self, id: HostId) {
        let mut hosts = self.hosts.borrow_mut();
        match hosts.iter().position(|host| host.id() == id) {
            Some(index) => {
                hosts.remove(index);
            }
            None => panic!("host {id:?} absent from the event logic working set"),
        }
        if hosts.is_empty() {
            debug!("working set empty; stopping window event logic");
            self.running.set(false);
        }
    }

    /// Starts the process, or restarts it for immediate execution when a
    /// host appears while it is stopped. Idempotent while running.
    pub(crate) fn ensure_running(&self) {
        if self.running.get() {
            return;
        }
        debug!("starting window event logic");
        self.running.set(true);
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        self.scheduler.execute(Box::new(move || this.run_pass(generation)));
    }

    fn run_pass(&self, generation: u64) {
        if !self.running.get() || self.generation.get() != generation {
            return;
        }

        // Snapshot first: drains mutate the working set when CLOSED fires.
        let snapshot: Vec<Rc<WindowHost>> = self.hosts.borrow().clone();
        for host in snapshot {
            // Every host is its own failure domain.
            self.scheduler.execute(Box::new(move || {
                let id = host.id();
                if let Err(payload) =
                    catch_unwind(AssertUnwindSafe(|| host.drain_pending_events()))
                {
                    error!(
                        host = ?id,
                        panic = %panic_message(payload.as_ref()),
                        "host drain failed; siblings unaffected"
                    );
                }
            }));
        }

        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        self.scheduler
            .execute_after(self.period, Box::new(move || this.run_pass(generation)));
    }
}
