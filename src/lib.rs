//! A windowing and input stack for a virtual desktop.
//!
//! Windows are created from an [`EventLoop`] and report what happens to them
//! through per-window callbacks, one slot per event kind. The desktop they
//! live on is simulated in-process, and a [`Desktop`] handle plays the role
//! of the user and the hardware: it moves the cursor, presses keys, plugs
//! and unplugs monitors, and reads back what windows have presented.
//!
//! ```
//! use sill::{EventLoop, WindowAttributes};
//!
//! let event_loop = EventLoop::<()>::new()?;
//! let window = event_loop.create_window(WindowAttributes::default().with_title("hello"))?;
//!
//! window.set_size_callback(Some(Box::new(|_window, extent| {
//!     tracing::info!("resized to {:?}", extent);
//! })));
//!
//! window.set_size(sill::geometry::WindowExtent::new(1024, 768))?;
//! event_loop.poll_events()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod geometry;
pub mod limits;
pub mod system;
pub mod time;

pub use system::{
    event_loop::{Config, EventLoop, EventLoopError, EventLoopWaker},
    window::{Window, WindowAttributes, WindowError, WindowId},
    Desktop, Framebuffer, Screenshot,
};
