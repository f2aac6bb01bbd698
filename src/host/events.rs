use serde::{Deserialize, Serialize};

use crate::sys::geometry::Rect;

/// Lifecycle events delivered to the client listener.
///
/// Within one drain pass a host's events fire in the declaration order below;
/// `Closed` fires at most once per host and nothing follows it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WindowEvent {
    Shown,
    Hidden,
    FocusGained,
    FocusLost,
    Iconified,
    Deiconified,
    Maximized,
    Demaximized,
    Moved,
    Resized,
    Closed,
}

/// Result of a paint callback.
///
/// A panicking paint callback is reported as [`PaintOutcome::Fallback`]
/// covering the whole damage region, so partially drawn output stays visible
/// instead of being discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintOutcome {
    /// The listener ran to completion and painted these regions.
    Painted(Vec<Rect>),
    /// The listener panicked; treat these regions as fully painted.
    Fallback(Vec<Rect>),
}

impl PaintOutcome {
    pub fn regions(&self) -> &[Rect] {
        match self {
            PaintOutcome::Painted(regions) | PaintOutcome::Fallback(regions) => regions,
        }
    }
}

/// Application callback interface. One method per event type; all bodies
/// default to no-ops so clients implement only what they observe.
///
/// Re-entrant host queries made from inside a callback see post-event state.
pub trait HostListener {
    fn on_window_shown(&mut self) {}
    fn on_window_hidden(&mut self) {}
    fn on_window_focus_gained(&mut self) {}
    fn on_window_focus_lost(&mut self) {}
    fn on_window_iconified(&mut self) {}
    fn on_window_deiconified(&mut self) {}
    fn on_window_maximized(&mut self) {}
    fn on_window_demaximized(&mut self) {}

    fn on_window_moved(&mut self, client_bounds: Rect) { let _ = client_bounds; }

    fn on_window_resized(&mut self, client_bounds: Rect) { let _ = client_bounds; }

    fn on_window_closed(&mut self) {}

    /// Repaint `damage` and return the regions actually painted.
    fn paint(&mut self, damage: Rect) -> Vec<Rect> { vec![damage] }
}
