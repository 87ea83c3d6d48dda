//! Static limits and constraints.

/// Maximum number of windows that can be open at once.
pub const MAX_WINDOWS: usize = 8;

/// The maximum number of UTF-8 bytes that can be used to represent a window title.
pub const MAX_WINDOW_TITLE_LENGTH: usize = 255;

/// The smallest width or height that a window can be created with or resized to.
pub const MIN_WINDOW_DIMENSION: i32 = 1;

/// The largest width or height that a window can be created with or resized to.
pub const MAX_WINDOW_DIMENSION: i32 = 16384;

/// Maximum number of monitors that can be connected at once.
pub const MAX_MONITORS: usize = 8;

/// The maximum number of video modes that a single monitor may expose.
pub const MAX_VIDEO_MODES: usize = 16;

/// The largest icon edge length accepted by [`Icon`](crate::system::icon::Icon).
pub const MAX_ICON_DIMENSION: u32 = 256;
