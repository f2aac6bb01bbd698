use serde::{Deserialize, Serialize};

use super::geometry::{Insets, Rect};

/// Identity of a backing window, assigned by the windowing system adapter.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HostId(pub u32);

impl HostId {
    #[inline]
    pub fn new(id: u32) -> Self { Self(id) }

    #[inline]
    pub fn as_u32(self) -> u32 { self.0 }
}

impl From<HostId> for u32 {
    #[inline]
    fn from(id: HostId) -> Self { id.0 }
}

/// The platform window a host wraps.
///
/// Implemented by per-toolkit adapters. Everything here runs on the UI
/// thread; commands are requests, not guarantees — the adapter reports what
/// actually happened through the host's `on_backing_window_*` entry points.
///
/// At least one of [`BackingWindow::window_bounds`] /
/// [`BackingWindow::client_bounds`] must be natively reported; the engine
/// derives the other side via insets.
pub trait BackingWindow {
    fn id(&self) -> HostId;

    /// Whether the platform window has been destroyed. Checked before every
    /// bounds query or command.
    fn is_closed(&self) -> bool;

    /// Outer frame in OS pixels, if the platform reports it natively.
    fn window_bounds(&self) -> Option<Rect>;

    /// Client area in OS pixels, if the platform reports it natively.
    fn client_bounds(&self) -> Option<Rect>;

    fn set_window_bounds(&self, bounds: Rect);

    fn set_client_bounds(&self, bounds: Rect);

    /// Border spans for a decorated window. Never queried for undecorated
    /// hosts.
    fn insets(&self) -> Insets;

    fn show(&self);
    fn hide(&self);
    fn focus(&self);
    fn unfocus(&self);
    fn iconify(&self);
    fn deiconify(&self);
    fn maximize(&self);
    fn demaximize(&self);

    /// One-shot destroy. After this the adapter must report
    /// [`BackingWindow::is_closed`] as true.
    fn close(&self);
}
