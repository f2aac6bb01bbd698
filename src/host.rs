//! The host state machine's job is to keep the client's view of one window
//! coherent with what the backing window system actually did.
//!
//! It takes commands from the application and asynchronous reports from the
//! backing adapter, folds both into a single set of confirmed lifecycle
//! flags, and defers client delivery to the window event logic so that
//! accumulated changes fire deterministically and a throwing listener cannot
//! abort the rest of a pass. Delivery works by diffing confirmed flags
//! against the shadow state the client last observed, which makes every
//! event exactly-once by construction.

pub mod bounds;
pub mod error;
pub mod events;
#[cfg(test)]
pub(crate) mod testing;
pub mod wrapper;

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use bitflags::bitflags;
use tracing::{debug, trace};

use self::bounds::BoundsHelper;
use self::events::{HostListener, PaintOutcome, WindowEvent};
use self::wrapper::ClientEventWrapper;
use crate::common::config::Settings;
use crate::registry::BindingRegistry;
use crate::sys::backing::{BackingWindow, HostId};
use crate::sys::executor::Scheduler;
use crate::sys::geometry::{Insets, Rect};

bitflags! {
    /// Backing-confirmed lifecycle state. Focus, iconified and maximized are
    /// independent axes over the showing/hidden base; defensive combinations
    /// (iconified and maximized at once) are representable even though most
    /// backings report only one at a time.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HostFlags: u8 {
        const SHOWING   = 1 << 0;
        const FOCUSED   = 1 << 1;
        const ICONIFIED = 1 << 2;
        const MAXIMIZED = 1 << 3;
        const CLOSED    = 1 << 4;
    }
}

/// State axes a backing report can toggle. Each axis is confirmed
/// independently through its own stability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Visibility = 0,
    Focus = 1,
    Iconified = 2,
    Maximized = 3,
}

impl Axis {
    fn flag(self) -> HostFlags {
        match self {
            Axis::Visibility => HostFlags::SHOWING,
            Axis::Focus => HostFlags::FOCUSED,
            Axis::Iconified => HostFlags::ICONIFIED,
            Axis::Maximized => HostFlags::MAXIMIZED,
        }
    }
}

/// A candidate state waiting out its stability window. Bumping the epoch
/// expires any scheduled commit for the previous candidate.
#[derive(Default)]
struct AxisTracker {
    epoch: Cell<u64>,
    candidate: Cell<Option<bool>>,
}

struct Delays {
    state: Duration,
    hidden: Duration,
    anti_flicker: Duration,
}

pub struct WindowHost {
    id: HostId,
    owner: Option<HostId>,
    decorated: bool,
    backing: Rc<dyn BackingWindow>,
    bounds: BoundsHelper,
    wrapper: ClientEventWrapper,
    scheduler: Rc<dyn Scheduler>,
    registry: Weak<BindingRegistry>,
    weak_self: Weak<WindowHost>,
    flags: Cell<HostFlags>,
    close_requested: Cell<bool>,
    /// Last client bounds seen while SHOWING and neither iconified nor
    /// maximized; restored when a de-iconify/de-maximize is confirmed.
    baseline: Cell<Option<Rect>>,
    last_client_bounds: Cell<Rect>,
    axes: [AxisTracker; 4],
    delays: Delays,
}

impl std::fmt::Debug for WindowHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHost")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("decorated", &self.decorated)
            .finish_non_exhaustive()
    }
}

impl WindowHost {
    pub(crate) fn new(
        backing: Rc<dyn BackingWindow>,
        listener: Box<dyn HostListener>,
        owner: Option<HostId>,
        decorated: bool,
        settings: &Settings,
        scheduler: Rc<dyn Scheduler>,
        registry: Weak<BindingRegistry>,
    ) -> Rc<WindowHost> {
        let id = backing.id();
        Rc::new_cyclic(|weak| WindowHost {
            id,
            owner,
            decorated,
            bounds: BoundsHelper::new(Rc::clone(&backing), decorated),
            wrapper: ClientEventWrapper::new(id, listener, settings.callback_policy),
            backing,
            scheduler,
            registry,
            weak_self: weak.clone(),
            flags: Cell::new(HostFlags::empty()),
            close_requested: Cell::new(false),
            baseline: Cell::new(None),
            last_client_bounds: Cell::new(Rect::EMPTY),
            axes: [
                AxisTracker::default(),
                AxisTracker::default(),
                AxisTracker::default(),
                AxisTracker::default(),
            ],
            delays: Delays {
                state: settings.state_stability_delay(),
                hidden: settings.hidden_stability_delay(),
                anti_flicker: settings.anti_flicker_delay(),
            },
        })
    }

    pub fn id(&self) -> HostId { self.id }

    pub fn owner(&self) -> Option<HostId> { self.owner }

    pub fn is_decorated(&self) -> bool { self.decorated }

    // Listener-visible state. These report what the client has been told,
    // not what the backing has confirmed but not yet delivered.

    pub fn is_showing(&self) -> bool { self.wrapper.is_showing() }

    pub fn is_focused(&self) -> bool { self.wrapper.is_focused() }

    pub fn is_iconified(&self) -> bool { self.wrapper.is_iconified() }

    pub fn is_maximized(&self) -> bool { self.wrapper.is_maximized() }

    pub fn is_closed(&self) -> bool { self.wrapper.is_closed() }

    pub fn moved_pending(&self) -> bool { self.wrapper.moved_pending() }

    pub fn resized_pending(&self) -> bool { self.wrapper.resized_pending() }

    pub fn client_bounds(&self) -> Rect { self.bounds.client_bounds() }

    pub fn window_bounds(&self) -> Rect { self.bounds.window_bounds() }

    pub fn insets(&self) -> Insets { self.bounds.insets() }

    // Application commands. Requests are forwarded to the backing window;
    // no client event fires until the matching confirmation arrives.

    pub fn show(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.show();
    }

    pub fn hide(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.hide();
    }

    pub fn request_focus_gain(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.focus();
    }

    pub fn request_focus_loss(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.unfocus();
    }

    pub fn iconify(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.iconify();
    }

    pub fn deiconify(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.deiconify();
    }

    pub fn maximize(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.maximize();
    }

    pub fn demaximize(&self) {
        if self.command_blocked() {
            return;
        }
        self.backing.demaximize();
    }

    pub fn set_client_bounds(&self, bounds: Rect) {
        if self.command_blocked() {
            return;
        }
        self.bounds.set_client_bounds(bounds);
    }

    pub fn set_window_bounds(&self, bounds: Rect) {
        if self.command_blocked() {
            return;
        }
        self.bounds.set_window_bounds(bounds);
    }

    /// Idempotent. The first call unregisters the host's handle, issues the
    /// one-shot backing close and marks the host closing; CLOSED itself is
    /// delivered by the next drain pass, after every other pending event for
    /// this host.
    pub fn close(&self) {
        if self.flags.get().contains(HostFlags::CLOSED) || self.close_requested.replace(true) {
            return;
        }
        debug!(host = ?self.id, "close requested");
        if let Some(registry) = self.registry.upgrade() {
            registry.on_closing(self.id);
        }
        self.backing.close();
    }

    /// Repaints `damage` through the client listener.
    pub fn paint(&self, damage: Rect) -> PaintOutcome { self.wrapper.fire_paint(damage) }

    // Backing notifications. Already marshalled onto the UI thread by the
    // adapter. Each updates confirmed flags through the matching stability
    // window and/or arms a pending flag; delivery happens on a later drain.

    pub fn on_backing_window_shown(&self) { self.note_axis(Axis::Visibility, true); }

    pub fn on_backing_window_hidden(&self) { self.note_axis(Axis::Visibility, false); }

    pub fn on_backing_window_focus_gained(&self) { self.note_axis(Axis::Focus, true); }

    pub fn on_backing_window_focus_lost(&self) { self.note_axis(Axis::Focus, false); }

    pub fn on_backing_window_iconified(&self) { self.note_axis(Axis::Iconified, true); }

    pub fn on_backing_window_deiconified(&self) { self.note_axis(Axis::Iconified, false); }

    pub fn on_backing_window_maximized(&self) { self.note_axis(Axis::Maximized, true); }

    pub fn on_backing_window_demaximized(&self) { self.note_axis(Axis::Maximized, false); }

    pub fn on_backing_window_moved(&self) {
        if self.closing() {
            return;
        }
        let current = self.bounds.client_bounds();
        let last = self.last_client_bounds.get();
        if current.same_origin(&last) {
            return;
        }
        trace!(host = ?self.id, ?current, "backing window moved");
        self.wrapper.set_moved_pending(true);
        // Only the origin component is consumed here; a resize report from
        // the same gesture must still see the old size.
        self.last_client_bounds.set(Rect { x: current.x, y: current.y, ..last });
        self.update_baseline(current);
    }

    pub fn on_backing_window_resized(&self) {
        if self.closing() {
            return;
        }
        let current = self.bounds.client_bounds();
        let last = self.last_client_bounds.get();
        if current.same_size(&last) {
            return;
        }
        trace!(host = ?self.id, ?current, "backing window resized");
        self.wrapper.set_resized_pending(true);
        self.last_client_bounds
            .set(Rect { width: current.width, height: current.height, ..last });
        self.update_baseline(current);
    }

    /// The backing window is going away on its own (user close button, OS
    /// shutdown). Same path as an application [`WindowHost::close`].
    pub fn on_backing_window_closing(&self) { self.close(); }

    /// Fires everything this host currently owes the client, in canonical
    /// order: visibility, focus, iconified, maximized, moved, resized, and
    /// CLOSED last once nothing else is pending. Invoked by the window event
    /// logic; safe to call directly to force delivery.
    pub fn drain_pending_events(&self) {
        if self.wrapper.is_closed() {
            return;
        }
        let flags = self.flags.get();
        let bounds = self.last_client_bounds.get();

        if flags.contains(HostFlags::SHOWING) != self.wrapper.is_showing() {
            let event = if flags.contains(HostFlags::SHOWING) {
                WindowEvent::Shown
            } else {
                WindowEvent::Hidden
            };
            self.wrapper.fire(event, bounds);
        }
        if flags.contains(HostFlags::FOCUSED) != self.wrapper.is_focused() {
            let event = if flags.contains(HostFlags::FOCUSED) {
                WindowEvent::FocusGained
            } else {
                WindowEvent::FocusLost
            };
            self.wrapper.fire(event, bounds);
        }
        if flags.contains(HostFlags::ICONIFIED) != self.wrapper.is_iconified() {
            let event = if flags.contains(HostFlags::ICONIFIED) {
                WindowEvent::Iconified
            } else {
                WindowEvent::Deiconified
            };
            self.wrapper.fire(event, bounds);
        }
        if flags.contains(HostFlags::MAXIMIZED) != self.wrapper.is_maximized() {
            let event = if flags.contains(HostFlags::MAXIMIZED) {
                WindowEvent::Maximized
            } else {
                WindowEvent::Demaximized
            };
            self.wrapper.fire(event, bounds);
        }
        if self.wrapper.moved_pending() {
            self.wrapper.fire(WindowEvent::Moved, bounds);
        }
        if self.wrapper.resized_pending() {
            self.wrapper.fire(WindowEvent::Resized, bounds);
        }

        if self.close_requested.get() {
            // Closing tail. Focus is relinquished before the synthesized
            // unmap, matching what toolkits report for a real close.
            if self.wrapper.is_focused() {
                self.wrapper.fire(WindowEvent::FocusLost, bounds);
            }
            if self.wrapper.is_showing() {
                self.wrapper.fire(WindowEvent::Hidden, bounds);
            }
            if let Some(registry) = self.registry.upgrade() {
                registry.on_closed_firing(self.id);
            }
            self.flags.set(self.flags.get() | HostFlags::CLOSED);
            self.wrapper.fire(WindowEvent::Closed, bounds);
        }
    }

    /// Captures the backing's current client bounds as the change-detection
    /// reference without arming any pending flag. Used once at creation.
    pub(crate) fn refresh_cached_bounds(&self) {
        let current = self.bounds.client_bounds();
        self.last_client_bounds.set(current);
        self.update_baseline(current);
    }

    fn update_baseline(&self, current: Rect) {
        let flags = self.flags.get();
        if flags.contains(HostFlags::SHOWING)
            && !flags.intersects(HostFlags::ICONIFIED | HostFlags::MAXIMIZED)
        {
            self.baseline.set(Some(current));
        }
    }

    fn closing(&self) -> bool {
        self.close_requested.get() || self.flags.get().contains(HostFlags::CLOSED)
    }

    fn command_blocked(&self) -> bool { self.closing() || self.backing.is_closed() }

    fn tracker(&self, axis: Axis) -> &AxisTracker { &self.axes[axis as usize] }

    fn delay_for(&self, axis: Axis, target: bool) -> Duration {
        match axis {
            Axis::Visibility if target => self.delays.anti_flicker,
            Axis::Visibility => self.delays.hidden,
            _ => self.delays.state,
        }
    }

    fn note_axis(&self, axis: Axis, target: bool) {
        if self.closing() {
            return;
        }
        let tracker = self.tracker(axis);
        if self.flags.get().contains(axis.flag()) == target {
            // The backing echoed the state we already hold; any opposite
            // candidate still waiting out its window was a flicker.
            tracker.candidate.set(None);
            tracker.epoch.set(tracker.epoch.get() + 1);
            return;
        }
        if tracker.candidate.get() == Some(target) {
            return;
        }
        let delay = self.delay_for(axis, target);
        if delay.is_zero() {
            tracker.candidate.set(None);
            tracker.epoch.set(tracker.epoch.get() + 1);
            self.commit_axis(axis, target);
            return;
        }
        tracker.candidate.set(Some(target));
        let epoch = tracker.epoch.get() + 1;
        tracker.epoch.set(epoch);
        let Some(host) = self.weak_self.upgrade() else {
            return;
        };
        self.scheduler
            .execute_after(delay, Box::new(move || host.commit_if_current(axis, epoch)));
    }

    fn commit_if_current(&self, axis: Axis, epoch: u64) {
        let tracker = self.tracker(axis);
        if tracker.epoch.get() != epoch {
            return;
        }
        if let Some(target) = tracker.candidate.take() {
            self.commit_axis(axis, target);
        }
    }

    fn commit_axis(&self, axis: Axis, target: bool) {
        let mut flags = self.flags.get();
        if flags.contains(HostFlags::CLOSED) || flags.contains(axis.flag()) == target {
            return;
        }
        flags.set(axis.flag(), target);
        self.flags.set(flags);
        trace!(host = ?self.id, ?axis, target, "backing state confirmed");

        // Leaving iconified/maximized returns the window to the remembered
        // baseline geometry; the backing reports the resulting move/resize
        // like any other.
        if matches!(axis, Axis::Iconified | Axis::Maximized) && !target {
            if let Some(baseline) = self.baseline.get() {
                self.bounds.set_client_bounds(baseline);
            }
        }

        // Plain showing state is the geometry to come back to later.
        if flags.contains(HostFlags::SHOWING)
            && !flags.intersects(HostFlags::ICONIFIED | HostFlags::MAXIMIZED)
        {
            self.baseline.set(Some(self.bounds.client_bounds()));
        }
    }
}
