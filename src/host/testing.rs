//! Simulated backing windows and scripted scenarios for state machine tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::WindowHost;
use super::events::{HostListener, WindowEvent};
use crate::common::config::Settings;
use crate::host::error::HostError;
use crate::registry::BindingRegistry;
use crate::sys::backing::{BackingWindow, HostId};
use crate::sys::executor::ManualExecutor;
use crate::sys::geometry::{Insets, Rect};

/// Raw commands a backing window received, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Show,
    Hide,
    Focus,
    Unfocus,
    Iconify,
    Deiconify,
    Maximize,
    Demaximize,
    Close,
    SetWindowBounds(Rect),
    SetClientBounds(Rect),
}

/// A scriptable backing window that records every raw command. The window
/// frame is the native side; the client area is derived through the insets,
/// or equal to the frame when the insets are zero.
pub struct SimBacking {
    id: HostId,
    closed: Cell<bool>,
    window: Cell<Rect>,
    insets: Cell<Insets>,
    client_native: bool,
    commands: RefCell<Vec<SimCommand>>,
}

impl SimBacking {
    pub fn window_native(id: HostId, window: Rect, insets: Insets) -> Rc<SimBacking> {
        Rc::new(SimBacking {
            id,
            closed: Cell::new(false),
            window: Cell::new(window),
            insets: Cell::new(insets),
            client_native: false,
            commands: RefCell::new(Vec::new()),
        })
    }

    pub fn commands(&self) -> Vec<SimCommand> { self.commands.borrow().clone() }

    pub fn window_bounds_raw(&self) -> Rect { self.window.get() }

    fn record(&self, command: SimCommand) { self.commands.borrow_mut().push(command); }

    // Confirmation helpers: "the window system reports that this actually
    // happened". All of them assume the notification has already been
    // marshalled onto the UI thread.

    pub fn confirm_shown(&self, host: &Rc<WindowHost>) { host.on_backing_window_shown(); }

    pub fn confirm_hidden(&self, host: &Rc<WindowHost>) { host.on_backing_window_hidden(); }

    pub fn confirm_focus_gained(&self, host: &Rc<WindowHost>) {
        host.on_backing_window_focus_gained();
    }

    pub fn confirm_focus_lost(&self, host: &Rc<WindowHost>) {
        host.on_backing_window_focus_lost();
    }

    pub fn confirm_iconified(&self, host: &Rc<WindowHost>) { host.on_backing_window_iconified(); }

    pub fn confirm_deiconified(&self, host: &Rc<WindowHost>) {
        host.on_backing_window_deiconified();
    }

    pub fn confirm_maximized(&self, host: &Rc<WindowHost>) { host.on_backing_window_maximized(); }

    pub fn confirm_demaximized(&self, host: &Rc<WindowHost>) {
        host.on_backing_window_demaximized();
    }

    /// Maximize confirmation plus the frame change the window system
    /// performs along with it.
    pub fn apply_maximized(&self, host: &Rc<WindowHost>, frame: Rect) {
        host.on_backing_window_maximized();
        self.window.set(frame);
        host.on_backing_window_moved();
        host.on_backing_window_resized();
    }
}

impl BackingWindow for SimBacking {
    fn id(&self) -> HostId { self.id }

    fn is_closed(&self) -> bool { self.closed.get() }

    fn window_bounds(&self) -> Option<Rect> { Some(self.window.get()) }

    fn client_bounds(&self) -> Option<Rect> {
        if self.client_native {
            Some(self.window.get().shrink(self.insets.get()))
        } else {
            None
        }
    }

    fn set_window_bounds(&self, bounds: Rect) {
        self.record(SimCommand::SetWindowBounds(bounds));
        self.window.set(bounds);
    }

    fn set_client_bounds(&self, bounds: Rect) {
        self.record(SimCommand::SetClientBounds(bounds));
        self.window.set(bounds.expand(self.insets.get()));
    }

    fn insets(&self) -> Insets { self.insets.get() }

    fn show(&self) { self.record(SimCommand::Show); }

    fn hide(&self) { self.record(SimCommand::Hide); }

    fn focus(&self) { self.record(SimCommand::Focus); }

    fn unfocus(&self) { self.record(SimCommand::Unfocus); }

    fn iconify(&self) { self.record(SimCommand::Iconify); }

    fn deiconify(&self) { self.record(SimCommand::Deiconify); }

    fn maximize(&self) { self.record(SimCommand::Maximize); }

    fn demaximize(&self) { self.record(SimCommand::Demaximize); }

    fn close(&self) {
        self.record(SimCommand::Close);
        self.closed.set(true);
    }
}

/// Shared log of events a listener observed.
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<WindowEvent>>>);

impl EventLog {
    pub fn new() -> EventLog { EventLog::default() }

    pub fn push(&self, event: WindowEvent) { self.0.borrow_mut().push(event); }

    pub fn events(&self) -> Vec<WindowEvent> { self.0.borrow().clone() }

    pub fn clear(&self) { self.0.borrow_mut().clear(); }
}

/// Listener that records every callback and can be told to panic inside a
/// chosen one, after recording it.
pub struct RecordingListener {
    log: EventLog,
    panic_on: Option<WindowEvent>,
    panic_in_paint: bool,
}

impl RecordingListener {
    pub fn new(log: EventLog) -> RecordingListener {
        RecordingListener { log, panic_on: None, panic_in_paint: false }
    }

    pub fn panic_on(mut self, event: WindowEvent) -> Self {
        self.panic_on = Some(event);
        self
    }

    pub fn panic_in_paint(mut self) -> Self {
        self.panic_in_paint = true;
        self
    }

    fn record(&self, event: WindowEvent) {
        self.log.push(event);
        if self.panic_on == Some(event) {
            panic!("listener failure injected for {event:?}");
        }
    }
}

impl HostListener for RecordingListener {
    fn on_window_shown(&mut self) { self.record(WindowEvent::Shown); }

    fn on_window_hidden(&mut self) { self.record(WindowEvent::Hidden); }

    fn on_window_focus_gained(&mut self) { self.record(WindowEvent::FocusGained); }

    fn on_window_focus_lost(&mut self) { self.record(WindowEvent::FocusLost); }

    fn on_window_iconified(&mut self) { self.record(WindowEvent::Iconified); }

    fn on_window_deiconified(&mut self) { self.record(WindowEvent::Deiconified); }

    fn on_window_maximized(&mut self) { self.record(WindowEvent::Maximized); }

    fn on_window_demaximized(&mut self) { self.record(WindowEvent::Demaximized); }

    fn on_window_moved(&mut self, _client_bounds: Rect) { self.record(WindowEvent::Moved); }

    fn on_window_resized(&mut self, _client_bounds: Rect) { self.record(WindowEvent::Resized); }

    fn on_window_closed(&mut self) { self.record(WindowEvent::Closed); }

    fn paint(&mut self, damage: Rect) -> Vec<Rect> {
        if self.panic_in_paint {
            panic!("paint failure injected");
        }
        vec![damage]
    }
}

/// One binding under test: a manual executor, a registry over it, and
/// helpers for creating scripted hosts.
pub struct Sim {
    pub executor: Rc<ManualExecutor>,
    pub registry: Rc<BindingRegistry>,
    period: Duration,
    ids: Cell<u32>,
}

impl Sim {
    pub fn new(settings: Settings) -> Sim {
        let executor = ManualExecutor::new();
        let period = settings.event_logic_period_duration();
        let registry = BindingRegistry::new(executor.clone(), settings);
        Sim { executor, registry, period, ids: Cell::new(1) }
    }

    fn next_id(&self) -> HostId {
        let id = self.ids.get();
        self.ids.set(id + 1);
        HostId::new(id)
    }

    pub fn create_host(&self) -> (Rc<WindowHost>, Rc<SimBacking>, EventLog) {
        self.create_host_with(|listener| listener)
    }

    pub fn create_host_with(
        &self,
        configure: impl FnOnce(RecordingListener) -> RecordingListener,
    ) -> (Rc<WindowHost>, Rc<SimBacking>, EventLog) {
        let backing = SimBacking::window_native(self.next_id(), Rect::EMPTY, Insets::ZERO);
        let log = EventLog::new();
        let listener = configure(RecordingListener::new(log.clone()));
        let host = self
            .registry
            .create_host(backing.clone(), Box::new(listener), None, false)
            .expect("host creation failed");
        // Consume the immediate startup pass so every tick() afterwards is
        // exactly one event-logic pass.
        self.executor.run_until_idle();
        (host, backing, log)
    }

    pub fn create_host_reusing_id(&self, id: HostId) -> Result<Rc<WindowHost>, HostError> {
        let backing = SimBacking::window_native(id, Rect::EMPTY, Insets::ZERO);
        let listener = RecordingListener::new(EventLog::new());
        self.registry.create_host(backing, Box::new(listener), None, false)
    }

    pub fn create_host_with_closed_backing(&self) -> Result<Rc<WindowHost>, HostError> {
        let backing = SimBacking::window_native(self.next_id(), Rect::EMPTY, Insets::ZERO);
        backing.close();
        let listener = RecordingListener::new(EventLog::new());
        self.registry.create_host(backing, Box::new(listener), None, false)
    }

    /// Runs one event-logic period of virtual time.
    pub fn tick(&self) { self.executor.advance(self.period); }

    pub fn advance(&self, delta: Duration) { self.executor.advance(delta); }

    pub fn apply(&self, host: &Rc<WindowHost>, backing: &Rc<SimBacking>, step: SimStep) {
        match step {
            SimStep::Show => host.show(),
            SimStep::Close => host.close(),
            SimStep::Settle => self.tick(),
            SimStep::MoveBy(dx, dy) => {
                let target = host.client_bounds().with_pos_deltas(dx, dy);
                host.set_client_bounds(target);
                host.on_backing_window_moved();
            }
            SimStep::ConfirmShown => backing.confirm_shown(host),
            SimStep::ConfirmHidden => backing.confirm_hidden(host),
            SimStep::ConfirmFocusGained => backing.confirm_focus_gained(host),
            SimStep::ConfirmFocusLost => backing.confirm_focus_lost(host),
            SimStep::ConfirmIconified => backing.confirm_iconified(host),
            SimStep::ConfirmDeiconified => backing.confirm_deiconified(host),
            SimStep::ConfirmMaximized => backing.confirm_maximized(host),
            SimStep::ConfirmDemaximized => backing.confirm_demaximized(host),
        }
    }
}

/// One step of a scripted interleaving, applied identically to the engine
/// and to [`ReferenceModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStep {
    Show,
    Close,
    Settle,
    MoveBy(i32, i32),
    ConfirmShown,
    ConfirmHidden,
    ConfirmFocusGained,
    ConfirmFocusLost,
    ConfirmIconified,
    ConfirmDeiconified,
    ConfirmMaximized,
    ConfirmDemaximized,
}

/// Equality classes over the observable state tuple. CLOSED is its own
/// class: no combination of live flags compares equal to a closed host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Hidden,
    Showing,
    ShowingFocused,
    ShowingIconified,
    ShowingMaximized,
    ShowingFocusedMaximized,
    Closed,
    Other,
}

pub fn classify(
    showing: bool,
    focused: bool,
    iconified: bool,
    maximized: bool,
    closed: bool,
) -> StateClass {
    if closed {
        return StateClass::Closed;
    }
    if !showing {
        return StateClass::Hidden;
    }
    match (focused, iconified, maximized) {
        (false, false, false) => StateClass::Showing,
        (true, false, false) => StateClass::ShowingFocused,
        (false, true, false) => StateClass::ShowingIconified,
        (false, false, true) => StateClass::ShowingMaximized,
        (true, false, true) => StateClass::ShowingFocusedMaximized,
        _ => StateClass::Other,
    }
}

/// Straight-line model of the engine's observable behavior under
/// zero-stability settings. Confirmed state commits immediately; settling
/// fires the diff against delivered state in canonical order.
pub struct ReferenceModel {
    confirmed_showing: bool,
    confirmed_focused: bool,
    confirmed_iconified: bool,
    confirmed_maximized: bool,
    delivered_showing: bool,
    delivered_focused: bool,
    delivered_iconified: bool,
    delivered_maximized: bool,
    delivered_closed: bool,
    close_requested: bool,
    moved_pending: bool,
    client_bounds: Rect,
    events: Vec<WindowEvent>,
}

impl ReferenceModel {
    pub fn new(initial_bounds: Rect) -> ReferenceModel {
        ReferenceModel {
            confirmed_showing: false,
            confirmed_focused: false,
            confirmed_iconified: false,
            confirmed_maximized: false,
            delivered_showing: false,
            delivered_focused: false,
            delivered_iconified: false,
            delivered_maximized: false,
            delivered_closed: false,
            close_requested: false,
            moved_pending: false,
            client_bounds: initial_bounds,
            events: Vec::new(),
        }
    }

    pub fn apply(&mut self, step: SimStep) {
        if step == SimStep::Settle {
            self.settle();
            return;
        }
        if self.close_requested || self.delivered_closed {
            // Only a settle does anything once closing has begun.
            return;
        }
        match step {
            SimStep::Show => {}
            SimStep::Close => self.close_requested = true,
            SimStep::MoveBy(dx, dy) => {
                self.client_bounds = self.client_bounds.with_pos_deltas(dx, dy);
                self.moved_pending = true;
            }
            SimStep::ConfirmShown => self.confirmed_showing = true,
            SimStep::ConfirmHidden => self.confirmed_showing = false,
            SimStep::ConfirmFocusGained => self.confirmed_focused = true,
            SimStep::ConfirmFocusLost => self.confirmed_focused = false,
            SimStep::ConfirmIconified => self.confirmed_iconified = true,
            SimStep::ConfirmDeiconified => self.confirmed_iconified = false,
            SimStep::ConfirmMaximized => self.confirmed_maximized = true,
            SimStep::ConfirmDemaximized => self.confirmed_maximized = false,
            SimStep::Settle => unreachable!(),
        }
    }

    fn settle(&mut self) {
        if self.delivered_closed {
            return;
        }
        if self.confirmed_showing != self.delivered_showing {
            self.events.push(if self.confirmed_showing {
                WindowEvent::Shown
            } else {
                WindowEvent::Hidden
            });
            self.delivered_showing = self.confirmed_showing;
        }
        if self.confirmed_focused != self.delivered_focused {
            self.events.push(if self.confirmed_focused {
                WindowEvent::FocusGained
            } else {
                WindowEvent::FocusLost
            });
            self.delivered_focused = self.confirmed_focused;
        }
        if self.confirmed_iconified != self.delivered_iconified {
            self.events.push(if self.confirmed_iconified {
                WindowEvent::Iconified
            } else {
                WindowEvent::Deiconified
            });
            self.delivered_iconified = self.confirmed_iconified;
        }
        if self.confirmed_maximized != self.delivered_maximized {
            self.events.push(if self.confirmed_maximized {
                WindowEvent::Maximized
            } else {
                WindowEvent::Demaximized
            });
            self.delivered_maximized = self.confirmed_maximized;
        }
        if self.moved_pending {
            self.events.push(WindowEvent::Moved);
            self.moved_pending = false;
        }
        if self.close_requested {
            if self.delivered_focused {
                self.events.push(WindowEvent::FocusLost);
                self.delivered_focused = false;
            }
            if self.delivered_showing {
                self.events.push(WindowEvent::Hidden);
                self.delivered_showing = false;
            }
            self.events.push(WindowEvent::Closed);
            self.delivered_closed = true;
        }
    }

    pub fn assert_matches(&self, host: &WindowHost, log: &EventLog) {
        assert_eq!(
            classify(
                host.is_showing(),
                host.is_focused(),
                host.is_iconified(),
                host.is_maximized(),
                host.is_closed(),
            ),
            classify(
                self.delivered_showing,
                self.delivered_focused,
                self.delivered_iconified,
                self.delivered_maximized,
                self.delivered_closed,
            ),
        );
        assert_eq!(host.is_showing(), self.delivered_showing);
        assert_eq!(host.is_focused(), self.delivered_focused);
        assert_eq!(host.is_iconified(), self.delivered_iconified);
        assert_eq!(host.is_maximized(), self.delivered_maximized);
        assert_eq!(host.is_closed(), self.delivered_closed);

        let expected_bounds =
            if self.delivered_closed { Rect::EMPTY } else { self.client_bounds };
        assert_eq!(host.client_bounds(), expected_bounds);
        assert_eq!(log.events(), self.events);
    }
}
