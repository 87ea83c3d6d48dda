//! Window-space geometry.
//!
//! Window coordinates are logical (scale-independent) and signed, with the
//! origin at the top-left of the virtual desktop. Framebuffer coordinates are
//! physical pixels, produced by scaling a window extent by its monitor's
//! [`DpiScale`].

use std::ops::Mul;

use crate::limits::MAX_WINDOW_DIMENSION;

/// A point in virtual desktop coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowPoint {
    pub x: i32,
    pub y: i32,
}

impl WindowPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The logical size of a window's content area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowExtent {
    pub width: i32,
    pub height: i32,
}

impl WindowExtent {
    pub const MAX: Self = Self {
        width: MAX_WINDOW_DIMENSION,
        height: MAX_WINDOW_DIMENSION,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn into_rect(self) -> WindowRect {
        WindowRect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// Both dimensions within `[MIN_WINDOW_DIMENSION, MAX_WINDOW_DIMENSION]`.
    pub fn is_valid(self) -> bool {
        let ok = |v: i32| (crate::limits::MIN_WINDOW_DIMENSION..=MAX_WINDOW_DIMENSION).contains(&v);
        ok(self.width) && ok(self.height)
    }

    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            width: self.width.clamp(min.width, max.width),
            height: self.height.clamp(min.height, max.height),
        }
    }
}

/// The size of a window's framebuffer in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FramebufferExtent {
    pub width: i32,
    pub height: i32,
}

impl FramebufferExtent {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn len(self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }
}

/// A window's placement in virtual desktop coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn at(origin: WindowPoint, extent: WindowExtent) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: extent.width,
            height: extent.height,
        }
    }

    pub const fn origin(self) -> WindowPoint {
        WindowPoint {
            x: self.x,
            y: self.y,
        }
    }

    pub const fn extent(self) -> WindowExtent {
        WindowExtent {
            width: self.width,
            height: self.height,
        }
    }

    pub fn center(self) -> WindowPoint {
        WindowPoint {
            x: self.x + self.width / 2,
            y: self.y + self.height / 2,
        }
    }

    pub fn contains(self, point: WindowPoint) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// The thickness of the window frame (decorations) on each side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInsets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FrameInsets {
    pub const ZERO: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// The rect of the whole window including decorations.
    pub fn grow(self, rect: WindowRect) -> WindowRect {
        WindowRect {
            x: rect.x - self.left,
            y: rect.y - self.top,
            width: rect.width + self.left + self.right,
            height: rect.height + self.top + self.bottom,
        }
    }
}

/// The ratio between physical pixels and logical window coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DpiScale {
    pub factor: f32,
}

impl DpiScale {
    pub const IDENTITY: Self = Self { factor: 1.0 };

    pub const fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl Default for DpiScale {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl Mul<WindowExtent> for DpiScale {
    type Output = FramebufferExtent;

    fn mul(self, rhs: WindowExtent) -> Self::Output {
        FramebufferExtent {
            width: (rhs.width as f32 * self.factor).round() as i32,
            height: (rhs.height as f32 * self.factor).round() as i32,
        }
    }
}

/// A forced width-to-height ratio, kept while resizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AspectRatio {
    pub numer: i32,
    pub denom: i32,
}

impl AspectRatio {
    pub const fn new(numer: i32, denom: i32) -> Self {
        Self { numer, denom }
    }

    pub fn is_valid(self) -> bool {
        self.numer > 0 && self.denom > 0
    }

    /// Recomputes the height of `extent` to match the ratio, rounding to the
    /// nearest integer. The width is left untouched.
    pub fn fit(self, extent: WindowExtent) -> WindowExtent {
        let numer = i64::from(self.numer);
        let denom = i64::from(self.denom);
        let height = (i64::from(extent.width) * denom + numer / 2) / numer;

        WindowExtent {
            width: extent.width,
            height: height as i32,
        }
    }
}
