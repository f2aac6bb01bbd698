use serde::{Deserialize, Serialize};

/// Rectangle in OS pixels. Signed origin, signed spans; a rectangle with a
/// non-positive span is considered empty.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Sentinel returned for any bounds query on a closed host.
    pub const EMPTY: Rect = Rect { x: 0, y: 0, width: 0, height: 0 };

    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Rect { Rect { x, y, width, height } }

    #[inline]
    pub fn is_empty(&self) -> bool { self.width <= 0 || self.height <= 0 }

    #[inline]
    pub fn with_pos_deltas(self, dx: i32, dy: i32) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..self }
    }

    #[inline]
    pub fn with_size(self, width: i32, height: i32) -> Rect { Rect { width, height, ..self } }

    #[inline]
    pub fn same_origin(&self, other: &Rect) -> bool { self.x == other.x && self.y == other.y }

    #[inline]
    pub fn same_size(&self, other: &Rect) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Client rectangle obtained by removing `insets` from a window rectangle.
    pub fn shrink(self, insets: Insets) -> Rect {
        Rect {
            x: self.x + insets.left,
            y: self.y + insets.top,
            width: self.width - insets.horizontal(),
            height: self.height - insets.vertical(),
        }
    }

    /// Window rectangle obtained by adding `insets` around a client rectangle.
    /// Exact inverse of [`Rect::shrink`] for any fixed insets.
    pub fn expand(self, insets: Insets) -> Rect {
        Rect {
            x: self.x - insets.left,
            y: self.y - insets.top,
            width: self.width + insets.horizontal(),
            height: self.height + insets.vertical(),
        }
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

/// Border spans separating window bounds from client bounds on a decorated
/// host. Undecorated hosts always use [`Insets::ZERO`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Insets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Insets {
    pub const ZERO: Insets = Insets { left: 0, top: 0, right: 0, bottom: 0 };

    #[inline]
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Insets {
        Insets { left, top, right, bottom }
    }

    #[inline]
    pub fn is_zero(&self) -> bool { *self == Insets::ZERO }

    #[inline]
    pub fn horizontal(&self) -> i32 { self.left + self.right }

    #[inline]
    pub fn vertical(&self) -> i32 { self.top + self.bottom }

    /// Insets observed between a window rectangle and the client rectangle it
    /// contains.
    pub fn between(window: Rect, client: Rect) -> Insets {
        Insets {
            left: client.x - window.x,
            top: client.y - window.y,
            right: (window.x + window.width) - (client.x + client.width),
            bottom: (window.y + window.height) - (client.y + client.height),
        }
    }
}
