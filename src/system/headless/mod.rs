//! The headless platform backend.
//!
//! The backend is a small virtual desktop: a set of monitors, a z-ordered set
//! of windows with software framebuffers, and the window-manager policy that
//! ties them together (focus, hover, fullscreen, auto-iconify). State changes
//! apply immediately; everything observable through callbacks goes through
//! the event queue and is delivered on the next pump.

pub(crate) mod desktop;
mod window;

use std::{
    cell::RefMut,
    collections::VecDeque,
    ops::{Deref, DerefMut},
    sync::Arc,
    time::{Duration, Instant},
};

use arrayvec::ArrayVec;
use parking_lot::{Condvar, Mutex};
use slotmap::SlotMap;

use crate::{
    geometry::{DpiScale, FramebufferExtent, WindowExtent, WindowPoint, WindowRect},
    limits::{MAX_MONITORS, MAX_WINDOWS},
    system::{
        event_loop::{Config, EventLoopError},
        icon::Icon,
        input::{ButtonState, KeyCode, ModifierKeys, MouseButton, ScrollAxis},
        monitor::{MonitorConfig, MonitorId, VideoMode},
        window::{WindowAttributes, WindowError, WindowId},
    },
    time::Hertz,
};

pub(crate) use window::{PlatformWindow, WindowFlags};

const DEFAULT_WINDOW_EXTENT: WindowExtent = WindowExtent::new(800, 600);

/// Offset between the default positions of consecutively created windows.
const CASCADE_STEP: i32 = 48;
const CASCADE_BASE: i32 = 64;

#[derive(Clone, Copy, Debug)]
pub(crate) enum Event {
    Moved {
        window: WindowId,
        position: WindowPoint,
    },
    Resized {
        window: WindowId,
        extent: WindowExtent,
    },
    FramebufferResized {
        window: WindowId,
        extent: FramebufferExtent,
    },
    CloseRequested {
        window: WindowId,
    },
    Focused {
        window: WindowId,
        focused: bool,
    },
    Iconified {
        window: WindowId,
        iconified: bool,
    },
    Damaged {
        window: WindowId,
    },
    CursorMoved {
        window: WindowId,
        position: WindowPoint,
    },
    CursorEntered {
        window: WindowId,
        entered: bool,
    },
    MouseButton {
        window: WindowId,
        button: MouseButton,
        state: ButtonState,
        modifiers: ModifierKeys,
    },
    Key {
        window: WindowId,
        key: KeyCode,
        state: ButtonState,
        modifiers: ModifierKeys,
    },
    Scroll {
        window: WindowId,
        axis: ScrollAxis,
        delta: f32,
    },
    MonitorConnected {
        monitor: MonitorId,
    },
    MonitorDisconnected {
        monitor: MonitorId,
    },
}

struct QueueState {
    events: VecDeque<Event>,
    wake_pending: bool,
}

/// The cross-thread half of the backend.
///
/// Everything else is single-threaded; this queue is what `post_empty_event`
/// and wakers touch from other threads.
pub(crate) struct EventQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                events: VecDeque::new(),
                wake_pending: false,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, event: Event) {
        let mut state = self.state.lock();
        state.events.push_back(event);
        self.ready.notify_one();
    }

    pub fn wake(&self) {
        let mut state = self.state.lock();
        state.wake_pending = true;
        self.ready.notify_one();
    }

    fn drain(state: &mut QueueState) -> Vec<Event> {
        state.wake_pending = false;
        state.events.drain(..).collect()
    }

    pub fn poll(&self) -> Vec<Event> {
        Self::drain(&mut self.state.lock())
    }

    /// Blocks until an event or a wake arrives, or until `timeout` elapses.
    pub fn wait(&self, timeout: Option<Duration>) -> Vec<Event> {
        let mut state = self.state.lock();

        match timeout {
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while state.events.is_empty() && !state.wake_pending {
                    if self.ready.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while state.events.is_empty() && !state.wake_pending {
                    self.ready.wait(&mut state);
                }
            }
        }

        Self::drain(&mut state)
    }
}

#[derive(Clone)]
pub(crate) struct QueueWaker {
    queue: Arc<EventQueue>,
}

impl QueueWaker {
    pub fn new(queue: Arc<EventQueue>) -> Self {
        Self { queue }
    }

    pub fn wake(&self) {
        self.queue.wake();
    }
}

pub(crate) struct MonitorRecord {
    pub name: String,
    pub position: WindowPoint,
    pub scale: DpiScale,
    pub current_mode: VideoMode,
    pub modes: ArrayVec<VideoMode, { crate::limits::MAX_VIDEO_MODES }>,
    pub connected: bool,
}

impl MonitorRecord {
    fn from_config(config: &MonitorConfig) -> Self {
        let native = config.native_mode();

        let mut modes = ArrayVec::new();
        modes.push(native);
        for mode in &config.modes {
            if !modes.contains(mode) && !modes.is_full() {
                modes.push(*mode);
            }
        }

        Self {
            name: config.name.clone(),
            position: config.position,
            scale: config.scale,
            current_mode: native,
            modes,
            connected: true,
        }
    }

    pub fn rect(&self) -> WindowRect {
        WindowRect::at(self.position, self.current_mode.extent)
    }
}

/// Mutable access to a window's back buffer.
///
/// Holds a borrow of the backend; release it before pumping events or calling
/// other window methods.
pub struct Framebuffer<'a> {
    pixels: RefMut<'a, Vec<u32>>,
    extent: FramebufferExtent,
}

impl<'a> Framebuffer<'a> {
    pub(crate) fn new(backend: RefMut<'a, Backend>, window: WindowId) -> Self {
        let extent = backend.window(window).framebuffer_extent();
        let pixels = RefMut::map(backend, |backend| backend.window_mut(window).back_buffer());

        Self { pixels, extent }
    }

    pub fn extent(&self) -> FramebufferExtent {
        self.extent
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Writes one pixel, ignoring out-of-bounds coordinates.
    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 || x >= self.extent.width || y >= self.extent.height {
            return;
        }

        let index = y as usize * self.extent.width as usize + x as usize;
        self.pixels[index] = color;
    }
}

impl Deref for Framebuffer<'_> {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl DerefMut for Framebuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}

pub(crate) struct Backend {
    monitors: SlotMap<MonitorId, MonitorRecord>,
    windows: SlotMap<WindowId, PlatformWindow>,
    /// Stacking order, bottom to top. Floating windows stack above the rest
    /// regardless of their position here.
    z_order: Vec<WindowId>,
    focused: Option<WindowId>,
    hovered: Option<WindowId>,
    cursor: WindowPoint,
    queue: Arc<EventQueue>,
}

impl Backend {
    pub fn new(config: &Config, queue: Arc<EventQueue>) -> Self {
        let mut monitors = SlotMap::with_key();
        for monitor in &config.monitors {
            monitors.insert(MonitorRecord::from_config(monitor));
        }

        Self {
            monitors,
            windows: SlotMap::with_key(),
            z_order: Vec::new(),
            focused: None,
            hovered: None,
            cursor: WindowPoint::new(0, 0),
            queue,
        }
    }

    fn push(&self, event: Event) {
        self.queue.push(event);
    }

    pub fn window(&self, id: WindowId) -> &PlatformWindow {
        self.windows.get(id).expect("window was destroyed")
    }

    pub fn window_mut(&mut self, id: WindowId) -> &mut PlatformWindow {
        self.windows.get_mut(id).expect("window was destroyed")
    }

    pub fn contains_window(&self, id: WindowId) -> bool {
        self.windows.contains_key(id)
    }

    pub fn monitor(&self, id: MonitorId) -> &MonitorRecord {
        self.monitors.get(id).expect("unknown monitor")
    }

    pub fn connected_monitors(&self) -> Vec<MonitorId> {
        self.monitors
            .iter()
            .filter(|(_, monitor)| monitor.connected)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn primary_monitor(&self) -> Option<MonitorId> {
        self.monitors
            .iter()
            .find(|(_, monitor)| monitor.connected)
            .map(|(id, _)| id)
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn cursor_position(&self) -> WindowPoint {
        self.cursor
    }

    // ---- windows -----------------------------------------------------------

    pub fn create_window(
        &mut self,
        attributes: &WindowAttributes,
        fullscreen: Option<MonitorId>,
    ) -> Result<WindowId, WindowError> {
        if self.windows.len() >= MAX_WINDOWS {
            return Err(WindowError::TooManyWindows);
        }

        if let Some(monitor) = fullscreen {
            if !self.monitor(monitor).connected {
                return Err(WindowError::MonitorDisconnected);
            }
        }

        let extent = attributes.size.unwrap_or(DEFAULT_WINDOW_EXTENT);
        let position = attributes
            .position
            .unwrap_or_else(|| self.cascade_position());
        let rect = WindowRect::at(position, extent);
        let scale = self.scale_for(rect, DpiScale::IDENTITY);

        let id = self.windows.insert(PlatformWindow::new(attributes, rect, scale));
        self.z_order.push(id);

        // Fix up the initial extent without emitting events; nothing has had
        // a chance to observe the window yet.
        let constrained = self.windows[id].constrain(extent);
        if constrained != extent {
            let _ = self.windows[id].set_rect(WindowRect::at(position, constrained), scale);
        }

        if let Some(monitor) = fullscreen {
            // Connectivity was checked above.
            let _ = self.set_fullscreen(id, monitor, None);
        } else if attributes.is_maximized {
            self.maximize(id);
        }

        if self.windows[id].is(WindowFlags::VISIBLE) {
            self.push(Event::Damaged { window: id });
            self.shift_focus(Some(id));
        }
        self.update_hover();

        tracing::debug!(
            "created window {:?} ({:?} at {:?})",
            id,
            self.windows[id].extent(),
            self.windows[id].position()
        );

        Ok(id)
    }

    pub fn destroy_window(&mut self, id: WindowId) {
        self.windows.remove(id);
        self.z_order.retain(|other| *other != id);

        if self.focused == Some(id) {
            self.focused = None;
            let next = self.top_focusable(None);
            self.shift_focus(next);
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        self.update_hover();

        tracing::debug!("destroyed window {:?}", id);
    }

    pub fn set_title(&mut self, id: WindowId, title: &str) {
        self.window_mut(id).title.clear();
        self.window_mut(id).title.push_str(title);
    }

    pub fn set_icon(&mut self, id: WindowId, icon: Option<Icon>) {
        self.window_mut(id).icon = icon;
    }

    pub fn request_move(&mut self, id: WindowId, position: WindowPoint) {
        if self.window(id).is_fullscreen() {
            tracing::debug!("move ignored for fullscreen window {:?}", id);
            return;
        }

        let extent = self.window(id).extent();
        self.apply_rect(id, WindowRect::at(position, extent));
    }

    pub fn request_resize(&mut self, id: WindowId, extent: WindowExtent) {
        if let Some(monitor) = self.window(id).monitor {
            // Fullscreen windows resize by switching to the closest mode.
            let mode = self.closest_mode(monitor, extent, None);
            self.window_mut(id).video_mode = Some(mode);

            let rect = WindowRect::at(self.monitor(monitor).position, mode.extent);
            self.apply_rect(id, rect);
        } else {
            let extent = self.window(id).constrain(extent);
            let position = self.window(id).position();
            self.apply_rect(id, WindowRect::at(position, extent));
        }
    }

    pub fn set_size_limits(
        &mut self,
        id: WindowId,
        min: Option<WindowExtent>,
        max: Option<WindowExtent>,
    ) {
        {
            let window = self.window_mut(id);
            window.min_size = min;
            window.max_size = max;
        }
        self.reapply_constraints(id);
    }

    pub fn set_aspect_ratio(&mut self, id: WindowId, ratio: Option<crate::geometry::AspectRatio>) {
        self.window_mut(id).aspect_ratio = ratio;
        self.reapply_constraints(id);
    }

    fn reapply_constraints(&mut self, id: WindowId) {
        if self.window(id).is_fullscreen() || self.window(id).is(WindowFlags::MAXIMIZED) {
            return;
        }

        let current = self.window(id).extent();
        let constrained = self.window(id).constrain(current);
        if constrained != current {
            let position = self.window(id).position();
            self.apply_rect(id, WindowRect::at(position, constrained));
        }
    }

    pub fn show(&mut self, id: WindowId) {
        if self.window(id).is(WindowFlags::VISIBLE) {
            return;
        }

        self.window_mut(id).flags.insert(WindowFlags::VISIBLE);
        self.push(Event::Damaged { window: id });
        self.shift_focus(Some(id));
    }

    pub fn hide(&mut self, id: WindowId) {
        if !self.window(id).is(WindowFlags::VISIBLE) {
            return;
        }

        self.window_mut(id).flags.remove(WindowFlags::VISIBLE);
        if self.focused == Some(id) {
            let next = self.top_focusable(Some(id));
            self.shift_focus(next);
        }
        self.update_hover();
    }

    pub fn iconify(&mut self, id: WindowId) {
        if self.window(id).is(WindowFlags::ICONIFIED) {
            return;
        }

        self.window_mut(id).flags.insert(WindowFlags::ICONIFIED);
        self.push(Event::Iconified {
            window: id,
            iconified: true,
        });

        if self.focused == Some(id) {
            let next = self.top_focusable(Some(id));
            self.shift_focus(next);
        }
        self.update_hover();
    }

    pub fn restore(&mut self, id: WindowId) {
        if self.window(id).is(WindowFlags::ICONIFIED) {
            self.window_mut(id).flags.remove(WindowFlags::ICONIFIED);
            self.push(Event::Iconified {
                window: id,
                iconified: false,
            });

            if let Some(monitor) = self.window(id).monitor {
                let mode = self
                    .window(id)
                    .video_mode
                    .unwrap_or(self.monitor(monitor).current_mode);
                let rect = WindowRect::at(self.monitor(monitor).position, mode.extent);
                self.apply_rect(id, rect);
            }
            self.update_hover();
        } else if self.window(id).is(WindowFlags::MAXIMIZED) {
            self.window_mut(id).flags.remove(WindowFlags::MAXIMIZED);

            let restore = self.window(id).restore_rect();
            let extent = self.window(id).constrain(restore.extent());
            self.apply_rect(id, WindowRect::at(restore.origin(), extent));
        }
    }

    pub fn maximize(&mut self, id: WindowId) {
        if self.window(id).is_fullscreen() || self.window(id).is(WindowFlags::MAXIMIZED) {
            return;
        }

        if self.window(id).is(WindowFlags::ICONIFIED) {
            self.window_mut(id).flags.remove(WindowFlags::ICONIFIED);
            self.push(Event::Iconified {
                window: id,
                iconified: false,
            });
        }

        let Some(monitor) = self.monitor_for(id) else {
            tracing::debug!("maximize ignored: no connected monitor");
            return;
        };

        self.window_mut(id).remember_rect();
        self.window_mut(id).flags.insert(WindowFlags::MAXIMIZED);

        let rect = self.monitor(monitor).rect();
        self.apply_rect(id, rect);
    }

    pub fn focus_window(&mut self, id: WindowId) {
        if self.window(id).is(WindowFlags::VISIBLE) && !self.window(id).is(WindowFlags::ICONIFIED) {
            self.shift_focus(Some(id));
        } else {
            tracing::debug!("focus request ignored for hidden or iconified window {:?}", id);
        }
    }

    pub fn set_fullscreen(
        &mut self,
        id: WindowId,
        monitor: MonitorId,
        mode: Option<VideoMode>,
    ) -> Result<(), WindowError> {
        if !self.monitor(monitor).connected {
            return Err(WindowError::MonitorDisconnected);
        }

        let mode = match mode {
            Some(mode) => self.closest_mode(monitor, mode.extent, Some(mode.refresh_rate)),
            None => self.monitor(monitor).current_mode,
        };

        if !self.window(id).is_fullscreen() && !self.window(id).is(WindowFlags::MAXIMIZED) {
            self.window_mut(id).remember_rect();
        }

        let scale = self.monitor(monitor).scale;
        {
            let window = self.window_mut(id);
            window.monitor = Some(monitor);
            window.video_mode = Some(mode);
            window.flags.remove(WindowFlags::MAXIMIZED);
            window.scale = scale;
        }

        let rect = WindowRect::at(self.monitor(monitor).position, mode.extent);
        self.apply_rect(id, rect);

        tracing::debug!("window {:?} fullscreen on monitor {:?}", id, monitor);
        Ok(())
    }

    pub fn set_windowed(&mut self, id: WindowId, rect: WindowRect) {
        {
            let window = self.window_mut(id);
            window.monitor = None;
            window.video_mode = None;
        }

        let extent = self.window(id).constrain(rect.extent());
        self.apply_rect(id, WindowRect::at(rect.origin(), extent));
        self.window_mut(id).remember_rect();
    }

    pub fn swap_buffers(&mut self, id: WindowId) {
        self.window_mut(id).present();
    }

    // ---- desktop-driven input ----------------------------------------------

    pub fn user_close(&mut self, id: WindowId) {
        self.push(Event::CloseRequested { window: id });
    }

    pub fn user_resize(&mut self, id: WindowId, extent: WindowExtent) {
        let window = self.window(id);
        if !window.is(WindowFlags::RESIZABLE)
            || window.is_fullscreen()
            || window.is(WindowFlags::ICONIFIED)
            || window.is(WindowFlags::MAXIMIZED)
        {
            tracing::debug!("user resize ignored for window {:?}", id);
            return;
        }

        let extent = window.constrain(extent);
        let position = window.position();
        self.apply_rect(id, WindowRect::at(position, extent));
    }

    pub fn user_move(&mut self, id: WindowId, position: WindowPoint) {
        let window = self.window(id);
        if window.is_fullscreen()
            || window.is(WindowFlags::ICONIFIED)
            || window.is(WindowFlags::MAXIMIZED)
        {
            tracing::debug!("user move ignored for window {:?}", id);
            return;
        }

        let extent = window.extent();
        self.apply_rect(id, WindowRect::at(position, extent));
    }

    pub fn damage(&mut self, id: WindowId) {
        self.push(Event::Damaged { window: id });
    }

    pub fn move_cursor(&mut self, position: WindowPoint) {
        self.cursor = position;
        self.update_hover();

        if let Some(id) = self.hovered {
            let client = self.client_point(id, position);
            self.window_mut(id).cursor = Some(client);
            self.push(Event::CursorMoved {
                window: id,
                position: client,
            });
        }
    }

    pub fn mouse_button(
        &mut self,
        button: MouseButton,
        state: ButtonState,
        modifiers: ModifierKeys,
    ) {
        let Some(id) = self.hovered else {
            return;
        };

        self.window_mut(id).note_button(button, state);

        // Click-to-focus before the button event itself.
        if state == ButtonState::Pressed && self.focused != Some(id) {
            self.shift_focus(Some(id));
        }

        self.push(Event::MouseButton {
            window: id,
            button,
            state,
            modifiers,
        });
    }

    pub fn key(&mut self, key: KeyCode, state: ButtonState, modifiers: ModifierKeys) {
        let Some(id) = self.focused else {
            return;
        };

        self.window_mut(id).note_key(key, state);
        self.push(Event::Key {
            window: id,
            key,
            state,
            modifiers,
        });
    }

    pub fn scroll(&mut self, axis: ScrollAxis, delta: f32) {
        let Some(id) = self.hovered else {
            return;
        };

        self.push(Event::Scroll {
            window: id,
            axis,
            delta,
        });
    }

    // ---- monitors ----------------------------------------------------------

    pub fn connect_monitor(&mut self, config: &MonitorConfig) -> Result<MonitorId, EventLoopError> {
        if self.connected_monitors().len() >= MAX_MONITORS {
            return Err(EventLoopError::TooManyMonitors);
        }
        if !config.is_valid() {
            return Err(EventLoopError::InvalidMonitorConfig {
                name: config.name.clone(),
            });
        }

        let id = self.monitors.insert(MonitorRecord::from_config(config));
        self.push(Event::MonitorConnected { monitor: id });
        tracing::info!("connected monitor {:?} ({})", id, config.name);

        self.refresh_scales();
        Ok(id)
    }

    pub fn disconnect_monitor(&mut self, id: MonitorId) {
        if !self.monitor(id).connected {
            return;
        }
        self.monitors[id].connected = false;

        // Fullscreen tenants fall back to their windowed rects.
        let tenants: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, window)| window.monitor == Some(id))
            .map(|(window, _)| window)
            .collect();
        for window in tenants {
            let restore = self.window(window).restore_rect();
            self.set_windowed(window, restore);
        }

        self.push(Event::MonitorDisconnected { monitor: id });
        tracing::info!("disconnected monitor {:?}", id);

        self.refresh_scales();
    }

    // ---- policy helpers ----------------------------------------------------

    fn cascade_position(&self) -> WindowPoint {
        let base = self
            .primary_monitor()
            .map(|monitor| self.monitor(monitor).position)
            .unwrap_or_default();
        let step = self.windows.len() as i32 * CASCADE_STEP;

        WindowPoint::new(base.x + CASCADE_BASE + step, base.y + CASCADE_BASE + step)
    }

    /// The scale of the monitor under `rect`'s center, the primary monitor's
    /// if no monitor contains it, or `current` when nothing is connected.
    fn scale_for(&self, rect: WindowRect, current: DpiScale) -> DpiScale {
        let center = rect.center();

        for (_, monitor) in &self.monitors {
            if monitor.connected && monitor.rect().contains(center) {
                return monitor.scale;
            }
        }

        self.primary_monitor()
            .map(|monitor| self.monitor(monitor).scale)
            .unwrap_or(current)
    }

    /// The connected monitor under the window's center, or the primary one.
    fn monitor_for(&self, id: WindowId) -> Option<MonitorId> {
        let center = self.window(id).rect().center();

        for (monitor, record) in &self.monitors {
            if record.connected && record.rect().contains(center) {
                return Some(monitor);
            }
        }

        self.primary_monitor()
    }

    fn closest_mode(
        &self,
        monitor: MonitorId,
        extent: WindowExtent,
        refresh_rate: Option<Hertz>,
    ) -> VideoMode {
        let record = self.monitor(monitor);
        let target_area = i64::from(extent.width) * i64::from(extent.height);

        let mut best = record.current_mode;
        let mut best_cost = (i64::MAX, f64::MAX);

        for mode in &record.modes {
            let area = i64::from(mode.extent.width) * i64::from(mode.extent.height);
            let cost = (
                (area - target_area).abs(),
                refresh_rate.map_or(0.0, |rate| (mode.refresh_rate.0 - rate.0).abs()),
            );
            if cost < best_cost {
                best_cost = cost;
                best = *mode;
            }
        }

        best
    }

    /// Moves and resizes a window, emitting events for what actually changed.
    /// Size events precede framebuffer events.
    fn apply_rect(&mut self, id: WindowId, rect: WindowRect) {
        let scale = if self.window(id).is_fullscreen() {
            self.window(id).scale
        } else {
            self.scale_for(rect, self.window(id).scale)
        };

        let delta = self.window_mut(id).set_rect(rect, scale);

        if delta.moved {
            self.push(Event::Moved {
                window: id,
                position: rect.origin(),
            });
        }
        if delta.resized {
            self.push(Event::Resized {
                window: id,
                extent: rect.extent(),
            });
        }
        if delta.rescaled {
            let extent = self.window(id).framebuffer_extent();
            self.push(Event::FramebufferResized { window: id, extent });
        }
        if delta.resized {
            self.push(Event::Damaged { window: id });
        }

        if delta.moved || delta.resized {
            self.update_hover();
        }
    }

    /// Recomputes every windowed window's scale after monitor changes.
    fn refresh_scales(&mut self) {
        let ids: Vec<WindowId> = self.windows.keys().collect();
        for id in ids {
            if self.window(id).is_fullscreen() {
                continue;
            }
            let rect = self.window(id).rect();
            self.apply_rect(id, rect);
        }
    }

    /// Windows from top to bottom as hover and focus see them.
    fn stacked_top_down(&self) -> Vec<WindowId> {
        let mut stack = Vec::with_capacity(self.z_order.len());
        for id in self.z_order.iter().rev() {
            if self.windows[*id].is(WindowFlags::FLOATING) {
                stack.push(*id);
            }
        }
        for id in self.z_order.iter().rev() {
            if !self.windows[*id].is(WindowFlags::FLOATING) {
                stack.push(*id);
            }
        }
        stack
    }

    fn top_focusable(&self, excluding: Option<WindowId>) -> Option<WindowId> {
        self.stacked_top_down().into_iter().find(|id| {
            Some(*id) != excluding
                && self.windows[*id].is(WindowFlags::VISIBLE)
                && !self.windows[*id].is(WindowFlags::ICONIFIED)
        })
    }

    fn raise(&mut self, id: WindowId) {
        self.z_order.retain(|other| *other != id);
        self.z_order.push(id);
    }

    /// Transfers focus, delivering the loss before the gain. A fullscreen
    /// window that loses focus iconifies if it asked for auto-iconify.
    fn shift_focus(&mut self, target: Option<WindowId>) {
        if self.focused == target {
            if let Some(id) = target {
                self.raise(id);
            }
            return;
        }

        let old = self.focused.take();
        if let Some(old_id) = old {
            if self.windows.contains_key(old_id) {
                self.window_mut(old_id).flags.remove(WindowFlags::FOCUSED);
                self.push(Event::Focused {
                    window: old_id,
                    focused: false,
                });
            }
        }

        self.focused = target;
        if let Some(new_id) = target {
            self.window_mut(new_id).flags.insert(WindowFlags::FOCUSED);
            self.raise(new_id);
            self.push(Event::Focused {
                window: new_id,
                focused: true,
            });
        }

        // After the bookkeeping so the iconify cannot recurse into another
        // focus shift for `old`.
        if let Some(old_id) = old {
            let auto = self.windows.get(old_id).is_some_and(|window| {
                window.is_fullscreen()
                    && window.is(WindowFlags::AUTO_ICONIFY)
                    && !window.is(WindowFlags::ICONIFIED)
            });
            if auto {
                self.iconify(old_id);
            }
        }

        self.update_hover();
    }

    fn client_point(&self, id: WindowId, point: WindowPoint) -> WindowPoint {
        let origin = self.window(id).position();
        WindowPoint::new(point.x - origin.x, point.y - origin.y)
    }

    /// Recomputes which window is under the cursor, emitting enter/leave
    /// events on changes.
    fn update_hover(&mut self) {
        let target = self.stacked_top_down().into_iter().find(|id| {
            let window = &self.windows[*id];
            window.is(WindowFlags::VISIBLE)
                && !window.is(WindowFlags::ICONIFIED)
                && window.rect().contains(self.cursor)
        });

        if target == self.hovered {
            return;
        }

        if let Some(old) = self.hovered {
            if self.windows.contains_key(old) {
                self.window_mut(old).flags.remove(WindowFlags::HOVERED);
                self.window_mut(old).cursor = None;
                self.push(Event::CursorEntered {
                    window: old,
                    entered: false,
                });
            }
        }

        self.hovered = target;
        if let Some(new) = target {
            self.window_mut(new).flags.insert(WindowFlags::HOVERED);
            let client = self.client_point(new, self.cursor);
            self.window_mut(new).cursor = Some(client);
            self.push(Event::CursorEntered {
                window: new,
                entered: true,
            });
        }
    }
}
