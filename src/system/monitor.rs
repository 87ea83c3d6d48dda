use std::{cell::RefCell, rc::Rc};

use arrayvec::ArrayVec;
use slotmap::new_key_type;

use crate::{
    geometry::{DpiScale, WindowExtent, WindowPoint, WindowRect},
    limits::MAX_VIDEO_MODES,
    time::Hertz,
};

use super::platform_impl;

new_key_type! {
    pub struct MonitorId;
}

/// A resolution and refresh rate supported by a monitor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMode {
    pub extent: WindowExtent,
    pub refresh_rate: Hertz,
}

impl VideoMode {
    pub const fn new(extent: WindowExtent, refresh_rate: Hertz) -> Self {
        Self {
            extent,
            refresh_rate,
        }
    }

    pub(crate) fn is_valid(self) -> bool {
        self.extent.is_valid() && self.refresh_rate.0 > 0.0
    }
}

/// Description of a virtual monitor, used when configuring an event loop and
/// when hot-plugging monitors through the desktop driver.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub name: String,
    pub position: WindowPoint,
    pub extent: WindowExtent,
    pub scale: DpiScale,
    pub refresh_rate: Hertz,
    /// Additional modes beyond the native one. The native mode is always
    /// available even if this list is empty.
    pub modes: ArrayVec<VideoMode, MAX_VIDEO_MODES>,
}

impl MonitorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, position: WindowPoint) -> Self {
        self.position = position;
        self
    }

    pub fn with_extent(mut self, extent: WindowExtent) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_scale(mut self, scale: DpiScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_refresh_rate(mut self, refresh_rate: Hertz) -> Self {
        self.refresh_rate = refresh_rate;
        self
    }

    pub fn with_mode(mut self, mode: VideoMode) -> Self {
        self.modes.push(mode);
        self
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.extent.is_valid()
            && self.scale.factor.is_finite()
            && self.scale.factor > 0.0
            && self.refresh_rate.0 > 0.0
            && self.modes.iter().all(|mode| mode.is_valid())
    }

    pub(crate) fn native_mode(&self) -> VideoMode {
        VideoMode::new(self.extent, self.refresh_rate)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            name: String::from("Virtual Display"),
            position: WindowPoint::new(0, 0),
            extent: WindowExtent::new(1920, 1080),
            scale: DpiScale::IDENTITY,
            refresh_rate: Hertz(60.0),
            modes: ArrayVec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorEvent {
    Connected,
    Disconnected,
}

pub type MonitorCallback = Box<dyn FnMut(&Monitor, MonitorEvent)>;

/// A handle to a monitor known to the event loop.
///
/// Handles stay valid after the monitor disconnects; the getters keep
/// reporting the monitor's last known state. Operations that need a live
/// monitor, such as going fullscreen on it, fail instead.
#[derive(Clone)]
pub struct Monitor {
    pub(crate) platform: Rc<RefCell<platform_impl::Backend>>,
    pub(crate) id: MonitorId,
}

impl Monitor {
    pub(crate) fn new(platform: Rc<RefCell<platform_impl::Backend>>, id: MonitorId) -> Self {
        Self { platform, id }
    }

    fn record<R>(&self, read: impl FnOnce(&platform_impl::MonitorRecord) -> R) -> R {
        read(self.platform.borrow().monitor(self.id))
    }

    pub fn id(&self) -> MonitorId {
        self.id
    }

    pub fn name(&self) -> String {
        self.record(|record| record.name.clone())
    }

    /// The top-left corner of the monitor in virtual desktop coordinates.
    pub fn position(&self) -> WindowPoint {
        self.record(|record| record.position)
    }

    /// The extent of the current video mode.
    pub fn extent(&self) -> WindowExtent {
        self.record(|record| record.current_mode.extent)
    }

    pub fn rect(&self) -> WindowRect {
        self.record(|record| record.rect())
    }

    pub fn scale(&self) -> DpiScale {
        self.record(|record| record.scale)
    }

    pub fn refresh_rate(&self) -> Hertz {
        self.record(|record| record.current_mode.refresh_rate)
    }

    pub fn current_mode(&self) -> VideoMode {
        self.record(|record| record.current_mode)
    }

    pub fn video_modes(&self) -> Vec<VideoMode> {
        self.record(|record| record.modes.iter().copied().collect())
    }

    pub fn is_connected(&self) -> bool {
        self.record(|record| record.connected)
    }
}

impl PartialEq for Monitor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Rc::ptr_eq(&self.platform, &other.platform)
    }
}

impl Eq for Monitor {}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validity() {
        assert!(MonitorConfig::default().is_valid());

        assert!(!MonitorConfig::default()
            .with_extent(WindowExtent::new(0, 1080))
            .is_valid());
        assert!(!MonitorConfig::default()
            .with_scale(DpiScale::new(0.0))
            .is_valid());
        assert!(!MonitorConfig::default()
            .with_refresh_rate(Hertz(0.0))
            .is_valid());
        assert!(!MonitorConfig::default()
            .with_mode(VideoMode::new(WindowExtent::new(-1, 600), Hertz(60.0)))
            .is_valid());
    }

    #[test]
    fn native_mode_matches_config() {
        let config = MonitorConfig::default()
            .with_extent(WindowExtent::new(2560, 1440))
            .with_refresh_rate(Hertz(144.0));

        let native = config.native_mode();
        assert_eq!(native.extent, WindowExtent::new(2560, 1440));
        assert_eq!(native.refresh_rate, Hertz(144.0));
    }
}
