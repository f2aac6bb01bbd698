//! The client event wrapper sits between the state machine and application
//! code. It owns the listener-visible shadow state, freezes it at closure,
//! and keeps listener panics out of engine control flow.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use tracing::{debug, error};

use super::events::{HostListener, PaintOutcome, WindowEvent};
use crate::common::config::CallbackPolicy;
use crate::sys::backing::HostId;
use crate::sys::geometry::Rect;

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "opaque panic payload"
    }
}

#[derive(Default)]
struct ShadowState {
    showing: Cell<bool>,
    focused: Cell<bool>,
    iconified: Cell<bool>,
    maximized: Cell<bool>,
    closed: Cell<bool>,
    moved_pending: Cell<bool>,
    resized_pending: Cell<bool>,
}

pub struct ClientEventWrapper {
    host: HostId,
    listener: RefCell<Box<dyn HostListener>>,
    state: ShadowState,
    policy: CallbackPolicy,
}

impl ClientEventWrapper {
    pub fn new(host: HostId, listener: Box<dyn HostListener>, policy: CallbackPolicy) -> Self {
        Self {
            host,
            listener: RefCell::new(listener),
            state: ShadowState::default(),
            policy,
        }
    }

    pub fn is_showing(&self) -> bool { self.state.showing.get() }

    pub fn is_focused(&self) -> bool { self.state.focused.get() }

    pub fn is_iconified(&self) -> bool { self.state.iconified.get() }

    pub fn is_maximized(&self) -> bool { self.state.maximized.get() }

    pub fn is_closed(&self) -> bool { self.state.closed.get() }

    pub fn moved_pending(&self) -> bool { self.state.moved_pending.get() }

    pub fn resized_pending(&self) -> bool { self.state.resized_pending.get() }

    pub(crate) fn set_moved_pending(&self, pending: bool) {
        if !self.state.closed.get() {
            self.state.moved_pending.set(pending);
        }
    }

    pub(crate) fn set_resized_pending(&self, pending: bool) {
        if !self.state.closed.get() {
            self.state.resized_pending.set(pending);
        }
    }

    /// Delivers one event to the listener.
    ///
    /// Shadow state is updated before the listener runs so re-entrant queries
    /// observe post-event values, and it stays updated even if the listener
    /// panics. Once `Closed` has been delivered every further call is a
    /// no-op, `Closed` included.
    pub(crate) fn fire(&self, event: WindowEvent, client_bounds: Rect) {
        if self.state.closed.get() {
            return;
        }
        match event {
            WindowEvent::Shown => self.state.showing.set(true),
            WindowEvent::Hidden => self.state.showing.set(false),
            WindowEvent::FocusGained => self.state.focused.set(true),
            WindowEvent::FocusLost => self.state.focused.set(false),
            WindowEvent::Iconified => self.state.iconified.set(true),
            WindowEvent::Deiconified => self.state.iconified.set(false),
            WindowEvent::Maximized => self.state.maximized.set(true),
            WindowEvent::Demaximized => self.state.maximized.set(false),
            WindowEvent::Moved => self.state.moved_pending.set(false),
            WindowEvent::Resized => self.state.resized_pending.set(false),
            WindowEvent::Closed => self.state.closed.set(true),
        }

        debug!(host = ?self.host, ?event, "delivering window event");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut listener = self.listener.borrow_mut();
            match event {
                WindowEvent::Shown => listener.on_window_shown(),
                WindowEvent::Hidden => listener.on_window_hidden(),
                WindowEvent::FocusGained => listener.on_window_focus_gained(),
                WindowEvent::FocusLost => listener.on_window_focus_lost(),
                WindowEvent::Iconified => listener.on_window_iconified(),
                WindowEvent::Deiconified => listener.on_window_deiconified(),
                WindowEvent::Maximized => listener.on_window_maximized(),
                WindowEvent::Demaximized => listener.on_window_demaximized(),
                WindowEvent::Moved => listener.on_window_moved(client_bounds),
                WindowEvent::Resized => listener.on_window_resized(client_bounds),
                WindowEvent::Closed => listener.on_window_closed(),
            }
        }));

        if let Err(payload) = outcome {
            match self.policy {
                CallbackPolicy::Forward => error!(
                    host = ?self.host,
                    ?event,
                    panic = %panic_message(payload.as_ref()),
                    "listener panicked during event delivery"
                ),
                CallbackPolicy::Rethrow => resume_unwind(payload),
            }
        }
    }

    /// Runs the paint callback under the same guard as [`fire`], but a panic
    /// never unwinds past here regardless of policy: the damage region is
    /// reported as fully painted instead.
    ///
    /// [`fire`]: ClientEventWrapper::fire
    pub(crate) fn fire_paint(&self, damage: Rect) -> PaintOutcome {
        if self.state.closed.get() {
            return PaintOutcome::Fallback(vec![damage]);
        }
        let outcome =
            catch_unwind(AssertUnwindSafe(|| self.listener.borrow_mut().paint(damage)));
        match outcome {
            Ok(regions) => PaintOutcome::Painted(regions),
            Err(payload) => {
                error!(
                    host = ?self.host,
                    panic = %panic_message(payload.as_ref()),
                    "paint callback panicked; treating damage as fully painted"
                );
                PaintOutcome::Fallback(vec![damage])
            }
        }
    }
}
