use std::rc::Rc;

use crate::sys::backing::BackingWindow;
use crate::sys::geometry::{Insets, Rect};

/// Closed-safe bounds access for one host.
///
/// The backing window natively reports at least one of the two rectangles;
/// the other side is derived through the insets. Derivation is a fixed point
/// under repeated round-trips as long as the backing geometry doesn't change
/// in between.
pub struct BoundsHelper {
    backing: Rc<dyn BackingWindow>,
    decorated: bool,
}

impl BoundsHelper {
    pub fn new(backing: Rc<dyn BackingWindow>, decorated: bool) -> Self {
        Self { backing, decorated }
    }

    /// Border spans in effect. Zero for undecorated or closed hosts; on a
    /// decorated host, measured from the two native rectangles when both are
    /// reported, otherwise taken from the backing directly.
    pub fn insets(&self) -> Insets {
        if !self.decorated || self.backing.is_closed() {
            return Insets::ZERO;
        }
        match (self.backing.window_bounds(), self.backing.client_bounds()) {
            (Some(window), Some(client)) => Insets::between(window, client),
            _ => self.backing.insets(),
        }
    }

    pub fn client_bounds(&self) -> Rect {
        if self.backing.is_closed() {
            return Rect::EMPTY;
        }
        if let Some(client) = self.backing.client_bounds() {
            return client;
        }
        match self.backing.window_bounds() {
            Some(window) => window.shrink(self.insets()),
            None => Rect::EMPTY,
        }
    }

    pub fn window_bounds(&self) -> Rect {
        if self.backing.is_closed() {
            return Rect::EMPTY;
        }
        if let Some(window) = self.backing.window_bounds() {
            return window;
        }
        match self.backing.client_bounds() {
            Some(client) => client.expand(self.insets()),
            None => Rect::EMPTY,
        }
    }

    /// Issues one raw bounds command for the requested client rectangle,
    /// targeting whichever side the backing reports natively. Silent no-op on
    /// a closed host.
    pub fn set_client_bounds(&self, client: Rect) {
        if self.backing.is_closed() {
            return;
        }
        if self.backing.client_bounds().is_some() {
            self.backing.set_client_bounds(client);
        } else {
            self.backing.set_window_bounds(client.expand(self.insets()));
        }
    }

    /// Counterpart of [`BoundsHelper::set_client_bounds`] for the window
    /// frame.
    pub fn set_window_bounds(&self, window: Rect) {
        if self.backing.is_closed() {
            return;
        }
        if self.backing.window_bounds().is_some() {
            self.backing.set_window_bounds(window);
        } else {
            self.backing.set_client_bounds(window.shrink(self.insets()));
        }
    }
}
