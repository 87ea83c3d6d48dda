use std::{
    borrow::Cow,
    cell::{Cell, Ref, RefCell, RefMut},
    rc::Rc,
};

use slotmap::new_key_type;

use crate::{
    geometry::{
        AspectRatio, DpiScale, FrameInsets, FramebufferExtent, WindowExtent, WindowPoint,
        WindowRect,
    },
    system::{
        callbacks::{
            CloseCallback, CursorEnterCallback, CursorPosCallback, FocusCallback,
            FramebufferSizeCallback, IconifyCallback, KeyCallback, MouseButtonCallback,
            PositionCallback, RefreshCallback, ScrollCallback, SizeCallback, WindowCallbacks,
        },
        event_loop::LoopShared,
        icon::Icon,
        input::{ButtonState, KeyCode, MouseButton},
        monitor::{Monitor, VideoMode},
        platform_impl::{Framebuffer, WindowFlags},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error(
        "The window title exceeds {} characters.",
        crate::limits::MAX_WINDOW_TITLE_LENGTH
    )]
    TitleTooLong,

    #[error("The maximum number of windows is open. Destroy one before creating another.")]
    TooManyWindows,

    #[error(
        "Window dimensions must be between {} and {} pixels.",
        crate::limits::MIN_WINDOW_DIMENSION,
        crate::limits::MAX_WINDOW_DIMENSION
    )]
    InvalidDimensions,

    #[error("The minimum window size must not exceed the maximum.")]
    InvalidSizeLimits,

    #[error("Aspect ratio terms must be positive.")]
    InvalidAspectRatio,

    #[error("The monitor is disconnected.")]
    MonitorDisconnected,

    #[error("The monitor belongs to a different event loop.")]
    ForeignMonitor,
}

new_key_type! {
    /// Identifies a window for as long as it exists. Stale ids are never
    /// reused for new windows.
    pub struct WindowId;
}

pub struct WindowAttributes {
    pub title: Cow<'static, str>,
    pub size: Option<WindowExtent>,
    pub min_size: Option<WindowExtent>,
    pub max_size: Option<WindowExtent>,
    pub position: Option<WindowPoint>,
    pub aspect_ratio: Option<AspectRatio>,
    pub is_visible: bool,
    pub is_resizable: bool,
    pub is_decorated: bool,
    pub is_floating: bool,
    pub is_maximized: bool,
    pub auto_iconify: bool,
    pub fullscreen: Option<Monitor>,
}

impl WindowAttributes {
    pub fn with_title(mut self, title: impl Into<Cow<'static, str>>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, size: WindowExtent) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_min_size(mut self, min_size: WindowExtent) -> Self {
        self.min_size = Some(min_size);
        self
    }

    pub fn with_max_size(mut self, max_size: WindowExtent) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_position(mut self, position: WindowPoint) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn with_visibility(mut self, is_visible: bool) -> Self {
        self.is_visible = is_visible;
        self
    }

    pub fn with_resizability(mut self, is_resizable: bool) -> Self {
        self.is_resizable = is_resizable;
        self
    }

    pub fn with_decorations(mut self, is_decorated: bool) -> Self {
        self.is_decorated = is_decorated;
        self
    }

    pub fn with_floating(mut self, is_floating: bool) -> Self {
        self.is_floating = is_floating;
        self
    }

    pub fn with_maximized(mut self, is_maximized: bool) -> Self {
        self.is_maximized = is_maximized;
        self
    }

    /// Whether the window iconifies when it is fullscreen and loses focus.
    pub fn with_auto_iconify(mut self, auto_iconify: bool) -> Self {
        self.auto_iconify = auto_iconify;
        self
    }

    /// Creates the window fullscreen on `monitor` at its current video mode.
    pub fn with_fullscreen(mut self, monitor: &Monitor) -> Self {
        self.fullscreen = Some(monitor.clone());
        self
    }
}

impl Default for WindowAttributes {
    fn default() -> Self {
        WindowAttributes {
            title: Cow::Borrowed(""),
            size: None,
            min_size: None,
            max_size: None,
            position: None,
            aspect_ratio: None,
            is_visible: true,
            is_resizable: true,
            is_decorated: true,
            is_floating: false,
            is_maximized: false,
            auto_iconify: true,
            fullscreen: None,
        }
    }
}

pub(crate) fn validate_attributes(attributes: &WindowAttributes) -> Result<(), WindowError> {
    if attributes.title.len() > crate::limits::MAX_WINDOW_TITLE_LENGTH {
        return Err(WindowError::TitleTooLong);
    }

    for extent in [attributes.size, attributes.min_size, attributes.max_size]
        .into_iter()
        .flatten()
    {
        if !extent.is_valid() {
            return Err(WindowError::InvalidDimensions);
        }
    }

    if let (Some(min), Some(max)) = (attributes.min_size, attributes.max_size) {
        if min.width > max.width || min.height > max.height {
            return Err(WindowError::InvalidSizeLimits);
        }
    }

    if let Some(ratio) = attributes.aspect_ratio {
        if !ratio.is_valid() {
            return Err(WindowError::InvalidAspectRatio);
        }
    }

    Ok(())
}

pub(crate) struct WindowShared<Data> {
    pub id: WindowId,
    pub should_close: Cell<bool>,
    pub data: RefCell<Data>,
    pub callbacks: WindowCallbacks<Data>,
}

impl<Data> WindowShared<Data> {
    pub fn new(id: WindowId, data: Data) -> Self {
        Self {
            id,
            should_close: Cell::new(false),
            data: RefCell::new(data),
            callbacks: WindowCallbacks::new(),
        }
    }
}

/// A handle to a window.
///
/// The handle returned by [`EventLoop::create_window`] owns the window: the
/// window is destroyed when that handle is dropped or passed to
/// [`Window::destroy`]. The handles passed to callbacks borrow the same
/// window and destroy nothing.
///
/// [`EventLoop::create_window`]: crate::system::event_loop::EventLoop::create_window
pub struct Window<Data = ()> {
    pub(crate) shared: Rc<WindowShared<Data>>,
    pub(crate) context: Rc<LoopShared<Data>>,
    owner: bool,
}

impl<Data> Window<Data> {
    pub(crate) fn owned(shared: Rc<WindowShared<Data>>, context: Rc<LoopShared<Data>>) -> Self {
        Self {
            shared,
            context,
            owner: true,
        }
    }

    pub(crate) fn view(shared: Rc<WindowShared<Data>>, context: Rc<LoopShared<Data>>) -> Self {
        Self {
            shared,
            context,
            owner: false,
        }
    }

    pub fn id(&self) -> WindowId {
        self.shared.id
    }

    pub fn title(&self) -> String {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .title
            .clone()
    }

    pub fn set_title(&self, title: &str) -> Result<(), WindowError> {
        if title.len() > crate::limits::MAX_WINDOW_TITLE_LENGTH {
            return Err(WindowError::TitleTooLong);
        }

        self.context
            .platform
            .borrow_mut()
            .set_title(self.shared.id, title);
        Ok(())
    }

    /// Sets the window's icon to whichever candidate is closest to the size
    /// the desktop displays. An empty slice reverts to the default icon.
    pub fn set_icon(&self, icons: &[Icon]) {
        const PREFERRED_EDGE: i64 = 32;

        let icon = icons
            .iter()
            .min_by_key(|icon| (i64::from(icon.edge()) - PREFERRED_EDGE).abs())
            .cloned();
        self.context
            .platform
            .borrow_mut()
            .set_icon(self.shared.id, icon);
    }

    /// The position of the window's client area, in desktop coordinates.
    pub fn position(&self) -> WindowPoint {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .position()
    }

    /// Moves the window. Ignored while fullscreen.
    pub fn set_position(&self, position: WindowPoint) {
        self.context
            .platform
            .borrow_mut()
            .request_move(self.shared.id, position);
    }

    pub fn size(&self) -> WindowExtent {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .extent()
    }

    /// Resizes the window's client area, subject to its size limits and
    /// aspect ratio. A fullscreen window switches to the closest video mode
    /// instead.
    pub fn set_size(&self, size: WindowExtent) -> Result<(), WindowError> {
        if !size.is_valid() {
            return Err(WindowError::InvalidDimensions);
        }

        self.context
            .platform
            .borrow_mut()
            .request_resize(self.shared.id, size);
        Ok(())
    }

    /// Bounds the sizes the window can take, by any means. `None` lifts a
    /// bound. The current size is re-constrained immediately.
    pub fn set_size_limits(
        &self,
        min_size: Option<WindowExtent>,
        max_size: Option<WindowExtent>,
    ) -> Result<(), WindowError> {
        for extent in [min_size, max_size].into_iter().flatten() {
            if !extent.is_valid() {
                return Err(WindowError::InvalidDimensions);
            }
        }
        if let (Some(min), Some(max)) = (min_size, max_size) {
            if min.width > max.width || min.height > max.height {
                return Err(WindowError::InvalidSizeLimits);
            }
        }

        self.context
            .platform
            .borrow_mut()
            .set_size_limits(self.shared.id, min_size, max_size);
        Ok(())
    }

    /// Forces the window's client area to keep `ratio`, or lifts the
    /// constraint with `None`. Size limits win when the two conflict.
    pub fn set_aspect_ratio(&self, ratio: Option<AspectRatio>) -> Result<(), WindowError> {
        if let Some(ratio) = ratio {
            if !ratio.is_valid() {
                return Err(WindowError::InvalidAspectRatio);
            }
        }

        self.context
            .platform
            .borrow_mut()
            .set_aspect_ratio(self.shared.id, ratio);
        Ok(())
    }

    /// The size of the window's framebuffer in pixels. Differs from
    /// [`size`](Self::size) when the DPI scale is not 1.
    pub fn framebuffer_size(&self) -> FramebufferExtent {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .framebuffer_extent()
    }

    /// The size of the frame decorations around the client area. Zero for
    /// undecorated and fullscreen windows.
    pub fn frame_insets(&self) -> FrameInsets {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .frame_insets()
    }

    pub fn dpi_scale(&self) -> DpiScale {
        self.context.platform.borrow().window(self.shared.id).scale
    }

    /// The monitor the window is fullscreen on, if it is fullscreen.
    pub fn monitor(&self) -> Option<Monitor> {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .monitor
            .map(|id| Monitor::new(Rc::clone(&self.context.platform), id))
    }

    /// Makes the window fullscreen on `monitor`, switching to the supported
    /// video mode closest to `mode` (the monitor's current mode if `None`).
    /// The windowed rect is remembered for [`set_windowed`](Self::set_windowed).
    pub fn set_fullscreen(
        &self,
        monitor: &Monitor,
        mode: Option<VideoMode>,
    ) -> Result<(), WindowError> {
        if !Rc::ptr_eq(&monitor.platform, &self.context.platform) {
            return Err(WindowError::ForeignMonitor);
        }

        self.context
            .platform
            .borrow_mut()
            .set_fullscreen(self.shared.id, monitor.id(), mode)
    }

    /// Leaves fullscreen and takes on the given rect.
    pub fn set_windowed(&self, rect: WindowRect) -> Result<(), WindowError> {
        if !rect.extent().is_valid() {
            return Err(WindowError::InvalidDimensions);
        }

        self.context
            .platform
            .borrow_mut()
            .set_windowed(self.shared.id, rect);
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.flag(WindowFlags::VISIBLE)
    }

    pub fn show(&self) {
        self.context.platform.borrow_mut().show(self.shared.id);
    }

    pub fn hide(&self) {
        self.context.platform.borrow_mut().hide(self.shared.id);
    }

    pub fn is_focused(&self) -> bool {
        self.flag(WindowFlags::FOCUSED)
    }

    /// Requests focus. Ignored for hidden and iconified windows.
    pub fn focus(&self) {
        self.context
            .platform
            .borrow_mut()
            .focus_window(self.shared.id);
    }

    pub fn is_iconified(&self) -> bool {
        self.flag(WindowFlags::ICONIFIED)
    }

    pub fn iconify(&self) {
        self.context.platform.borrow_mut().iconify(self.shared.id);
    }

    /// Undoes iconification if the window is iconified, otherwise undoes
    /// maximization.
    pub fn restore(&self) {
        self.context.platform.borrow_mut().restore(self.shared.id);
    }

    pub fn is_maximized(&self) -> bool {
        self.flag(WindowFlags::MAXIMIZED)
    }

    /// Maximizes the window over its monitor. Ignored while fullscreen.
    pub fn maximize(&self) {
        self.context.platform.borrow_mut().maximize(self.shared.id);
    }

    pub fn is_hovered(&self) -> bool {
        self.flag(WindowFlags::HOVERED)
    }

    pub fn is_resizable(&self) -> bool {
        self.flag(WindowFlags::RESIZABLE)
    }

    pub fn is_decorated(&self) -> bool {
        self.flag(WindowFlags::DECORATED)
    }

    pub fn is_floating(&self) -> bool {
        self.flag(WindowFlags::FLOATING)
    }

    pub fn should_close(&self) -> bool {
        self.shared.should_close.get()
    }

    /// Sets or clears the close flag. Setting it does not destroy the window;
    /// clearing it inside a close callback cancels the close.
    pub fn set_should_close(&self, should_close: bool) {
        self.shared.should_close.set(should_close);
    }

    pub fn data(&self) -> Ref<'_, Data> {
        self.shared.data.borrow()
    }

    /// Panics if the data is already borrowed, as it is when called from
    /// inside a callback that holds a borrow.
    pub fn data_mut(&self) -> RefMut<'_, Data> {
        self.shared.data.borrow_mut()
    }

    pub fn replace_data(&self, data: Data) -> Data {
        self.shared.data.replace(data)
    }

    /// The most recent state of `key` while the window has focus.
    pub fn key_state(&self, key: KeyCode) -> ButtonState {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .key_state(key)
    }

    pub fn mouse_button_state(&self, button: MouseButton) -> ButtonState {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .button_state(button)
    }

    /// The cursor's position in client coordinates while the window is
    /// hovered.
    pub fn cursor_position(&self) -> Option<WindowPoint> {
        self.context
            .platform
            .borrow()
            .window(self.shared.id)
            .cursor
    }

    /// Borrows the window's back buffer for drawing. Release the borrow
    /// before pumping events or touching other window state.
    pub fn framebuffer(&self) -> Framebuffer<'_> {
        Framebuffer::new(self.context.platform.borrow_mut(), self.shared.id)
    }

    /// Publishes the back buffer as the window's contents.
    pub fn swap_buffers(&self) {
        self.context
            .platform
            .borrow_mut()
            .swap_buffers(self.shared.id);
    }

    /// Destroys the window now instead of at the end of the handle's scope.
    pub fn destroy(self) {}

    fn flag(&self, flag: WindowFlags) -> bool {
        self.context.platform.borrow().window(self.shared.id).is(flag)
    }

    // Callback registration. Each window has one slot per event kind; the
    // previous callback is returned so it can be restored later.

    pub fn set_size_callback(
        &self,
        callback: Option<SizeCallback<Data>>,
    ) -> Option<SizeCallback<Data>> {
        self.shared.callbacks.size.replace(callback)
    }

    pub fn set_position_callback(
        &self,
        callback: Option<PositionCallback<Data>>,
    ) -> Option<PositionCallback<Data>> {
        self.shared.callbacks.position.replace(callback)
    }

    pub fn set_close_callback(
        &self,
        callback: Option<CloseCallback<Data>>,
    ) -> Option<CloseCallback<Data>> {
        self.shared.callbacks.close.replace(callback)
    }

    pub fn set_focus_callback(
        &self,
        callback: Option<FocusCallback<Data>>,
    ) -> Option<FocusCallback<Data>> {
        self.shared.callbacks.focus.replace(callback)
    }

    pub fn set_iconify_callback(
        &self,
        callback: Option<IconifyCallback<Data>>,
    ) -> Option<IconifyCallback<Data>> {
        self.shared.callbacks.iconify.replace(callback)
    }

    pub fn set_refresh_callback(
        &self,
        callback: Option<RefreshCallback<Data>>,
    ) -> Option<RefreshCallback<Data>> {
        self.shared.callbacks.refresh.replace(callback)
    }

    pub fn set_framebuffer_size_callback(
        &self,
        callback: Option<FramebufferSizeCallback<Data>>,
    ) -> Option<FramebufferSizeCallback<Data>> {
        self.shared.callbacks.framebuffer_size.replace(callback)
    }

    pub fn set_key_callback(
        &self,
        callback: Option<KeyCallback<Data>>,
    ) -> Option<KeyCallback<Data>> {
        self.shared.callbacks.key.replace(callback)
    }

    pub fn set_mouse_button_callback(
        &self,
        callback: Option<MouseButtonCallback<Data>>,
    ) -> Option<MouseButtonCallback<Data>> {
        self.shared.callbacks.mouse_button.replace(callback)
    }

    pub fn set_cursor_pos_callback(
        &self,
        callback: Option<CursorPosCallback<Data>>,
    ) -> Option<CursorPosCallback<Data>> {
        self.shared.callbacks.cursor_pos.replace(callback)
    }

    pub fn set_cursor_enter_callback(
        &self,
        callback: Option<CursorEnterCallback<Data>>,
    ) -> Option<CursorEnterCallback<Data>> {
        self.shared.callbacks.cursor_enter.replace(callback)
    }

    pub fn set_scroll_callback(
        &self,
        callback: Option<ScrollCallback<Data>>,
    ) -> Option<ScrollCallback<Data>> {
        self.shared.callbacks.scroll.replace(callback)
    }
}

impl<Data> Drop for Window<Data> {
    fn drop(&mut self) {
        if !self.owner {
            return;
        }

        self.context.windows.borrow_mut().remove(self.shared.id);
        self.context
            .platform
            .borrow_mut()
            .destroy_window(self.shared.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_defaults() {
        let attributes = WindowAttributes::default();

        assert!(attributes.is_visible);
        assert!(attributes.is_resizable);
        assert!(attributes.is_decorated);
        assert!(attributes.auto_iconify);
        assert!(!attributes.is_floating);
        assert!(!attributes.is_maximized);
        assert!(attributes.fullscreen.is_none());
    }

    #[test]
    fn validation_rejects_long_titles() {
        let attributes = WindowAttributes::default()
            .with_title("a".repeat(crate::limits::MAX_WINDOW_TITLE_LENGTH + 1));

        assert!(matches!(
            validate_attributes(&attributes),
            Err(WindowError::TitleTooLong)
        ));
    }

    #[test]
    fn validation_rejects_inverted_limits() {
        let attributes = WindowAttributes::default()
            .with_min_size(WindowExtent::new(800, 600))
            .with_max_size(WindowExtent::new(640, 480));

        assert!(matches!(
            validate_attributes(&attributes),
            Err(WindowError::InvalidSizeLimits)
        ));
    }

    #[test]
    fn validation_rejects_degenerate_sizes() {
        let attributes = WindowAttributes::default().with_size(WindowExtent::new(0, 600));

        assert!(matches!(
            validate_attributes(&attributes),
            Err(WindowError::InvalidDimensions)
        ));
    }

    #[test]
    fn validation_rejects_zero_aspect_terms() {
        let attributes =
            WindowAttributes::default().with_aspect_ratio(AspectRatio { numer: 0, denom: 9 });

        assert!(matches!(
            validate_attributes(&attributes),
            Err(WindowError::InvalidAspectRatio)
        ));
    }
}
