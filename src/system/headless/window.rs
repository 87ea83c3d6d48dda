use bitflags::bitflags;

use crate::{
    geometry::{
        AspectRatio, DpiScale, FrameInsets, FramebufferExtent, WindowExtent, WindowPoint,
        WindowRect,
    },
    limits::MIN_WINDOW_DIMENSION,
    system::{
        icon::Icon,
        input::{ButtonState, KeyCode, MouseButton},
        monitor::{MonitorId, VideoMode},
        window::WindowAttributes,
    },
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct WindowFlags: u16 {
        const VISIBLE = 1 << 0;
        const FOCUSED = 1 << 1;
        const ICONIFIED = 1 << 2;
        const MAXIMIZED = 1 << 3;
        const HOVERED = 1 << 4;
        const RESIZABLE = 1 << 5;
        const DECORATED = 1 << 6;
        const FLOATING = 1 << 7;
        const AUTO_ICONIFY = 1 << 8;
    }
}

/// Synthetic decoration thickness reported for decorated windows.
pub(crate) const DECORATED_INSETS: FrameInsets = FrameInsets {
    left: 1,
    top: 24,
    right: 1,
    bottom: 1,
};

/// Which parts of a window's placement changed in a [`set_rect`] call.
///
/// [`set_rect`]: PlatformWindow::set_rect
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RectDelta {
    pub moved: bool,
    pub resized: bool,
    pub rescaled: bool,
}

/// The backend's record of a single window.
///
/// Placement, state flags, and the software framebuffer live here; policy
/// that spans windows (focus, hover, monitors) lives in the backend itself.
pub(crate) struct PlatformWindow {
    pub title: String,
    pub flags: WindowFlags,
    rect: WindowRect,
    restore_rect: WindowRect,
    pub min_size: Option<WindowExtent>,
    pub max_size: Option<WindowExtent>,
    pub aspect_ratio: Option<AspectRatio>,
    pub monitor: Option<MonitorId>,
    pub video_mode: Option<VideoMode>,
    pub scale: DpiScale,
    pub icon: Option<Icon>,
    front: Vec<u32>,
    back: Vec<u32>,
    framebuffer: FramebufferExtent,
    pub present_count: u64,
    /// Client-relative cursor position while the window is hovered.
    pub cursor: Option<WindowPoint>,
    pressed_keys: Vec<KeyCode>,
    pressed_buttons: Vec<MouseButton>,
}

impl PlatformWindow {
    pub fn new(attributes: &WindowAttributes, rect: WindowRect, scale: DpiScale) -> Self {
        let mut flags = WindowFlags::empty();
        flags.set(WindowFlags::VISIBLE, attributes.is_visible);
        flags.set(WindowFlags::RESIZABLE, attributes.is_resizable);
        flags.set(WindowFlags::DECORATED, attributes.is_decorated);
        flags.set(WindowFlags::FLOATING, attributes.is_floating);
        flags.set(WindowFlags::AUTO_ICONIFY, attributes.auto_iconify);

        let framebuffer = scale * rect.extent();

        Self {
            title: attributes.title.to_string(),
            flags,
            rect,
            restore_rect: rect,
            min_size: attributes.min_size,
            max_size: attributes.max_size,
            aspect_ratio: attributes.aspect_ratio,
            monitor: None,
            video_mode: None,
            scale,
            icon: None,
            front: vec![0; framebuffer.len()],
            back: vec![0; framebuffer.len()],
            framebuffer,
            present_count: 0,
            cursor: None,
            pressed_keys: Vec::new(),
            pressed_buttons: Vec::new(),
        }
    }

    pub fn rect(&self) -> WindowRect {
        self.rect
    }

    pub fn position(&self) -> WindowPoint {
        self.rect.origin()
    }

    pub fn extent(&self) -> WindowExtent {
        self.rect.extent()
    }

    pub fn framebuffer_extent(&self) -> FramebufferExtent {
        self.framebuffer
    }

    pub fn restore_rect(&self) -> WindowRect {
        self.restore_rect
    }

    /// Captures the current rect as the target for a later restore.
    pub fn remember_rect(&mut self) {
        self.restore_rect = self.rect;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.monitor.is_some()
    }

    pub fn is(&self, flags: WindowFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn frame_insets(&self) -> FrameInsets {
        if self.is(WindowFlags::DECORATED) && !self.is_fullscreen() {
            DECORATED_INSETS
        } else {
            FrameInsets::ZERO
        }
    }

    /// Clamps to the size limits, then fits the aspect ratio, then clamps the
    /// recomputed height again so the limits always win.
    pub fn constrain(&self, extent: WindowExtent) -> WindowExtent {
        let min = self
            .min_size
            .unwrap_or(WindowExtent::new(MIN_WINDOW_DIMENSION, MIN_WINDOW_DIMENSION));
        let max = self.max_size.unwrap_or(WindowExtent::MAX);

        let mut extent = extent.clamp(min, max);
        if let Some(ratio) = self.aspect_ratio {
            extent = ratio.fit(extent);
            extent.height = extent.height.clamp(min.height, max.height);
        }

        extent
    }

    /// Moves and resizes the window, reallocating the framebuffer when the
    /// physical extent changes. Buffers start out cleared to zero.
    pub fn set_rect(&mut self, rect: WindowRect, scale: DpiScale) -> RectDelta {
        let moved = rect.origin() != self.rect.origin();
        let resized = rect.extent() != self.rect.extent();

        self.rect = rect;
        self.scale = scale;

        let framebuffer = scale * rect.extent();
        let rescaled = framebuffer != self.framebuffer;
        if rescaled {
            self.framebuffer = framebuffer;
            self.front = vec![0; framebuffer.len()];
            self.back = vec![0; framebuffer.len()];
        }

        RectDelta {
            moved,
            resized,
            rescaled,
        }
    }

    pub fn back_buffer(&mut self) -> &mut Vec<u32> {
        &mut self.back
    }

    pub fn front_buffer(&self) -> &[u32] {
        &self.front
    }

    pub fn present(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
        self.present_count += 1;
    }

    pub fn note_key(&mut self, key: KeyCode, state: ButtonState) {
        if state.is_pressed() {
            if !self.pressed_keys.contains(&key) {
                self.pressed_keys.push(key);
            }
        } else {
            self.pressed_keys.retain(|pressed| *pressed != key);
        }
    }

    pub fn note_button(&mut self, button: MouseButton, state: ButtonState) {
        if state.is_pressed() {
            if !self.pressed_buttons.contains(&button) {
                self.pressed_buttons.push(button);
            }
        } else {
            self.pressed_buttons.retain(|pressed| *pressed != button);
        }
    }

    pub fn key_state(&self, key: KeyCode) -> ButtonState {
        if self.pressed_keys.contains(&key) {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }

    pub fn button_state(&self, button: MouseButton) -> ButtonState {
        if self.pressed_buttons.contains(&button) {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(attributes: &WindowAttributes) -> PlatformWindow {
        PlatformWindow::new(
            attributes,
            WindowRect::new(0, 0, 800, 600),
            DpiScale::IDENTITY,
        )
    }

    #[test]
    fn constrain_clamps_before_fitting_aspect() {
        let mut window = window(&WindowAttributes::default());
        window.min_size = Some(WindowExtent::new(400, 300));
        window.max_size = Some(WindowExtent::new(1600, 900));
        window.aspect_ratio = Some(AspectRatio::new(16, 9));

        // Width clamps to 1600, then the ratio recomputes the height.
        assert_eq!(
            window.constrain(WindowExtent::new(4000, 500)),
            WindowExtent::new(1600, 900)
        );

        // The recomputed height is clamped again.
        window.max_size = Some(WindowExtent::new(1600, 700));
        assert_eq!(
            window.constrain(WindowExtent::new(1600, 600)),
            WindowExtent::new(1600, 700)
        );
    }

    #[test]
    fn constrain_without_limits_is_identity() {
        let window = window(&WindowAttributes::default());

        assert_eq!(
            window.constrain(WindowExtent::new(123, 456)),
            WindowExtent::new(123, 456)
        );
    }

    #[test]
    fn set_rect_reports_changes() {
        let mut window = window(&WindowAttributes::default());

        let delta = window.set_rect(WindowRect::new(10, 10, 800, 600), DpiScale::IDENTITY);
        assert!(delta.moved);
        assert!(!delta.resized);
        assert!(!delta.rescaled);

        let delta = window.set_rect(WindowRect::new(10, 10, 640, 480), DpiScale::IDENTITY);
        assert!(!delta.moved);
        assert!(delta.resized);
        assert!(delta.rescaled);
        assert_eq!(window.framebuffer_extent(), FramebufferExtent::new(640, 480));
    }

    #[test]
    fn rescale_without_resize() {
        let mut window = window(&WindowAttributes::default());

        let delta = window.set_rect(window.rect(), DpiScale::new(2.0));
        assert!(!delta.moved);
        assert!(!delta.resized);
        assert!(delta.rescaled);
        assert_eq!(
            window.framebuffer_extent(),
            FramebufferExtent::new(1600, 1200)
        );
        assert_eq!(window.back_buffer().len(), 1600 * 1200);
    }

    #[test]
    fn present_flips_buffers() {
        let mut window = window(&WindowAttributes::default());

        window.back_buffer()[0] = 0xFFFF_FFFF;
        window.present();

        assert_eq!(window.front_buffer()[0], 0xFFFF_FFFF);
        assert_eq!(window.back_buffer()[0], 0);
        assert_eq!(window.present_count, 1);
    }

    #[test]
    fn key_tracking() {
        let mut window = window(&WindowAttributes::default());

        window.note_key(KeyCode::A, ButtonState::Pressed);
        assert_eq!(window.key_state(KeyCode::A), ButtonState::Pressed);
        assert_eq!(window.key_state(KeyCode::B), ButtonState::Released);

        window.note_key(KeyCode::A, ButtonState::Repeated);
        assert_eq!(window.key_state(KeyCode::A), ButtonState::Pressed);

        window.note_key(KeyCode::A, ButtonState::Released);
        assert_eq!(window.key_state(KeyCode::A), ButtonState::Released);
    }

    #[test]
    fn insets_depend_on_state() {
        let mut decorated = window(&WindowAttributes::default());
        assert_eq!(decorated.frame_insets(), DECORATED_INSETS);

        decorated.monitor = Some(MonitorId::default());
        assert_eq!(decorated.frame_insets(), FrameInsets::ZERO);

        let undecorated = window(&WindowAttributes::default().with_decorations(false));
        assert_eq!(undecorated.frame_insets(), FrameInsets::ZERO);
    }
}
