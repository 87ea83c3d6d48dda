use std::{cell::RefCell, rc::Rc};

use crate::{
    geometry::{FramebufferExtent, WindowExtent, WindowPoint},
    system::{
        event_loop::EventLoopError,
        icon::Icon,
        input::{ButtonState, KeyCode, ModifierKeys, MouseButton, ScrollAxis},
        monitor::{Monitor, MonitorConfig},
        window::Window,
    },
};

use super::Backend;

/// Drives the virtual desktop from the outside: plugging monitors, moving the
/// cursor, pressing keys, and inspecting what windows have presented.
///
/// Actions take effect immediately and queue events for the next pump, the
/// same way a real desktop would interleave with the event loop.
#[derive(Clone)]
pub struct Desktop {
    platform: Rc<RefCell<Backend>>,
}

impl Desktop {
    pub(crate) fn new(platform: Rc<RefCell<Backend>>) -> Self {
        Self { platform }
    }

    /// Plugs in a monitor and returns a handle to it.
    pub fn connect_monitor(&self, config: MonitorConfig) -> Result<Monitor, EventLoopError> {
        let id = self.platform.borrow_mut().connect_monitor(&config)?;
        Ok(Monitor::new(Rc::clone(&self.platform), id))
    }

    /// Unplugs a monitor. Fullscreen windows on it return to their windowed
    /// rects; existing handles stay valid and report the last known state.
    pub fn disconnect_monitor(&self, monitor: &Monitor) {
        self.platform.borrow_mut().disconnect_monitor(monitor.id());
    }

    /// The user clicks the window's close button.
    pub fn request_close<Data>(&self, window: &Window<Data>) {
        self.platform.borrow_mut().user_close(window.id());
    }

    /// The user drags the window's resize handle. Ignored for windows that
    /// are not resizable, or that are fullscreen, iconified, or maximized.
    pub fn drag_resize<Data>(&self, window: &Window<Data>, extent: WindowExtent) {
        self.platform.borrow_mut().user_resize(window.id(), extent);
    }

    /// The user drags the window's title bar.
    pub fn drag_move<Data>(&self, window: &Window<Data>, position: WindowPoint) {
        self.platform.borrow_mut().user_move(window.id(), position);
    }

    /// Moves the cursor, in desktop coordinates.
    pub fn move_cursor(&self, position: WindowPoint) {
        self.platform.borrow_mut().move_cursor(position);
    }

    /// Presses or releases a mouse button over the hovered window, if any.
    pub fn mouse_button(&self, button: MouseButton, state: ButtonState, modifiers: ModifierKeys) {
        self.platform
            .borrow_mut()
            .mouse_button(button, state, modifiers);
    }

    /// Presses or releases a key; it goes to the focused window, if any.
    pub fn key(&self, key: KeyCode, state: ButtonState, modifiers: ModifierKeys) {
        self.platform.borrow_mut().key(key, state, modifiers);
    }

    /// Scrolls the wheel over the hovered window, if any.
    pub fn scroll(&self, axis: ScrollAxis, delta: f32) {
        self.platform.borrow_mut().scroll(axis, delta);
    }

    /// Invalidates the window's contents, as an occlusion change would.
    pub fn damage<Data>(&self, window: &Window<Data>) {
        self.platform.borrow_mut().damage(window.id());
    }

    /// Copies the window's most recently presented pixels.
    pub fn screenshot<Data>(&self, window: &Window<Data>) -> Screenshot {
        let platform = self.platform.borrow();
        let record = platform.window(window.id());

        Screenshot {
            extent: record.framebuffer_extent(),
            pixels: record.front_buffer().to_vec(),
        }
    }

    /// How many times the window has presented.
    pub fn present_count<Data>(&self, window: &Window<Data>) -> u64 {
        self.platform.borrow().window(window.id()).present_count
    }

    /// The icon the window would show in a task bar, if one was set.
    pub fn window_icon<Data>(&self, window: &Window<Data>) -> Option<Icon> {
        self.platform.borrow().window(window.id()).icon.clone()
    }
}

/// A copy of a window's presented pixels, row-major from the top left.
pub struct Screenshot {
    extent: FramebufferExtent,
    pixels: Vec<u32>,
}

impl Screenshot {
    pub fn extent(&self) -> FramebufferExtent {
        self.extent
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Reads one pixel. Panics if the coordinates are out of bounds, like
    /// slice indexing.
    pub fn pixel(&self, x: i32, y: i32) -> u32 {
        assert!(x >= 0 && x < self.extent.width, "x out of bounds");
        assert!(y >= 0 && y < self.extent.height, "y out of bounds");

        self.pixels[y as usize * self.extent.width as usize + x as usize]
    }
}
