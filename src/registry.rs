//! The binding host registry owns the live-host set for one binding: the
//! handle→host map, the creation-ordered list, and the window event logic
//! that drives delivery for all of them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::common::collections::HashMap;
use crate::common::config::{DefaultBoundsMode, Settings};
use crate::event_logic::EventLogicProcess;
use crate::host::WindowHost;
use crate::host::error::HostError;
use crate::host::events::HostListener;
use crate::sys::backing::{BackingWindow, HostId};
use crate::sys::executor::Scheduler;

pub struct BindingRegistry {
    scheduler: Rc<dyn Scheduler>,
    settings: Settings,
    weak_self: Weak<BindingRegistry>,
    hosts: RefCell<HashMap<HostId, Rc<WindowHost>>>,
    creation_order: RefCell<Vec<HostId>>,
    event_logic: Rc<EventLogicProcess>,
}

impl BindingRegistry {
    pub fn new(scheduler: Rc<dyn Scheduler>, settings: Settings) -> Rc<BindingRegistry> {
        let event_logic =
            EventLogicProcess::new(Rc::clone(&scheduler), settings.event_logic_period_duration());
        Rc::new_cyclic(|weak| BindingRegistry {
            scheduler,
            settings,
            weak_self: weak.clone(),
            hosts: RefCell::new(HashMap::default()),
            creation_order: RefCell::new(Vec::new()),
            event_logic,
        })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn event_logic(&self) -> &Rc<EventLogicProcess> { &self.event_logic }

    pub fn host(&self, id: HostId) -> Option<Rc<WindowHost>> {
        self.hosts.borrow().get(&id).cloned()
    }

    pub fn host_count(&self) -> usize { self.hosts.borrow().len() }

    /// Hosts in creation order.
    pub fn hosts(&self) -> Vec<Rc<WindowHost>> {
        let map = self.hosts.borrow();
        self.creation_order
            .borrow()
            .iter()
            .filter_map(|id| map.get(id).cloned())
            .collect()
    }

    /// Creates a host over `backing` and registers it with the window event
    /// logic. Default bounds are applied synchronously as the final step, so
    /// a panicking backing surfaces at the creation site rather than on a
    /// later tick.
    pub fn create_host(
        &self,
        backing: Rc<dyn BackingWindow>,
        listener: Box<dyn HostListener>,
        owner: Option<HostId>,
        decorated: bool,
    ) -> Result<Rc<WindowHost>, HostError> {
        let id = backing.id();
        if backing.is_closed() {
            return Err(HostError::BackingClosed(id));
        }
        if self.hosts.borrow().contains_key(&id) {
            return Err(HostError::AlreadyRegistered(id));
        }

        let host = WindowHost::new(
            backing,
            listener,
            owner,
            decorated,
            &self.settings,
            Rc::clone(&self.scheduler),
            self.weak_self.clone(),
        );
        debug!(host = ?id, decorated, "host created");
        self.hosts.borrow_mut().insert(id, Rc::clone(&host));
        self.creation_order.borrow_mut().push(id);
        self.event_logic.register(Rc::clone(&host));
        self.event_logic.ensure_running();

        match self.settings.default_bounds_mode {
            DefaultBoundsMode::Client => host.set_client_bounds(self.settings.default_bounds),
            DefaultBoundsMode::Window => host.set_window_bounds(self.settings.default_bounds),
        }
        host.refresh_cached_bounds();
        Ok(host)
    }

    /// Invoked once per host when its close begins, before any close event
    /// has fired. The host must still be registered; anything else is an
    /// engine bug.
    pub(crate) fn on_closing(&self, id: HostId) {
        let removed = self.hosts.borrow_mut().remove(&id);
        if removed.is_none() {
            panic!("closing hook invoked for unregistered host {id:?}");
        }
        let mut order = self.creation_order.borrow_mut();
        match order.iter().position(|&host| host == id) {
            Some(index) => {
                order.remove(index);
            }
            None => panic!("host {id:?} missing from the creation-order list"),
        }
        debug!(host = ?id, "host unregistered");
    }

    /// Invoked when a host's CLOSED event is about to fire: the host leaves
    /// the event logic working set, stopping the process if it was the last.
    pub(crate) fn on_closed_firing(&self, id: HostId) { self.event_logic.unregister(id); }

    /// Closes every open host synchronously and drains each one so CLOSED is
    /// delivered before the scheduler is torn down.
    pub fn shutdown(&self) {
        let open = self.hosts();
        if !open.is_empty() {
            warn!(hosts = open.len(), "shutting down with open hosts");
        }
        for host in open {
            host.close();
            let id = host.id();
            if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                host.drain_pending_events()
            })) {
                tracing::error!(
                    host = ?id,
                    panic = %crate::host::wrapper::panic_message(payload.as_ref()),
                    "host drain failed during shutdown"
                );
            }
        }
    }
}
