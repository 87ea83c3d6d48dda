use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use slotmap::SecondaryMap;

use crate::{
    limits::MAX_MONITORS,
    system::{
        callbacks::Slot,
        monitor::{Monitor, MonitorCallback, MonitorConfig, MonitorEvent},
        platform_impl::{self, desktop::Desktop},
        window::{validate_attributes, Window, WindowAttributes, WindowError, WindowId, WindowShared},
    },
};

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("Events are already being dispatched. Pumping cannot nest.")]
    AlreadyPumping,

    #[error("The configuration lists no monitors.")]
    NoMonitors,

    #[error(
        "The configuration lists more than {} monitors.",
        crate::limits::MAX_MONITORS
    )]
    TooManyMonitors,

    #[error("Monitor configuration \"{name}\" is invalid.")]
    InvalidMonitorConfig { name: String },
}

/// The monitors present when the event loop starts. More can be connected
/// later through [`Desktop::connect_monitor`].
pub struct Config {
    pub monitors: Vec<MonitorConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitors: vec![MonitorConfig::default()],
        }
    }
}

pub(crate) struct LoopShared<Data> {
    pub platform: Rc<RefCell<platform_impl::Backend>>,
    pub queue: Arc<platform_impl::EventQueue>,
    pub windows: RefCell<SecondaryMap<WindowId, Rc<WindowShared<Data>>>>,
    pub monitor_callback: Slot<dyn FnMut(&Monitor, MonitorEvent)>,
    pub pumping: Cell<bool>,
    pub started: Instant,
}

/// An event loop for a virtual desktop.
///
/// Windows, monitors, and the loop itself stay on the thread that created
/// them; [`EventLoopWaker`] is the one piece that may cross threads. Each
/// window carries one `Data` value for its callbacks to share.
pub struct EventLoop<Data = ()> {
    shared: Rc<LoopShared<Data>>,
}

impl<Data> EventLoop<Data> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self, EventLoopError> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self, EventLoopError> {
        if config.monitors.is_empty() {
            return Err(EventLoopError::NoMonitors);
        }
        if config.monitors.len() > MAX_MONITORS {
            return Err(EventLoopError::TooManyMonitors);
        }
        for monitor in &config.monitors {
            if !monitor.is_valid() {
                return Err(EventLoopError::InvalidMonitorConfig {
                    name: monitor.name.clone(),
                });
            }
        }

        let queue = Arc::new(platform_impl::EventQueue::new());
        let platform = Rc::new(RefCell::new(platform_impl::Backend::new(
            &config,
            Arc::clone(&queue),
        )));

        tracing::info!("event loop started with {} monitor(s)", config.monitors.len());

        Ok(Self {
            shared: Rc::new(LoopShared {
                platform,
                queue,
                windows: RefCell::new(SecondaryMap::new()),
                monitor_callback: Slot::new(),
                pumping: Cell::new(false),
                started: Instant::now(),
            }),
        })
    }

    pub fn create_window(&self, attributes: WindowAttributes) -> Result<Window<Data>, WindowError>
    where
        Data: Default,
    {
        self.create_window_with(attributes, Data::default())
    }

    pub fn create_window_with(
        &self,
        attributes: WindowAttributes,
        data: Data,
    ) -> Result<Window<Data>, WindowError> {
        validate_attributes(&attributes)?;

        let fullscreen = match &attributes.fullscreen {
            Some(monitor) => {
                if !Rc::ptr_eq(&monitor.platform, &self.shared.platform) {
                    return Err(WindowError::ForeignMonitor);
                }
                Some(monitor.id())
            }
            None => None,
        };

        let id = self
            .shared
            .platform
            .borrow_mut()
            .create_window(&attributes, fullscreen)?;

        let shared = Rc::new(WindowShared::new(id, data));
        self.shared.windows.borrow_mut().insert(id, Rc::clone(&shared));

        Ok(Window::owned(shared, Rc::clone(&self.shared)))
    }

    /// Dispatches every pending event and returns without blocking.
    ///
    /// The count excludes events whose window was destroyed before they were
    /// dispatched.
    pub fn poll_events(&self) -> Result<usize, EventLoopError> {
        let _guard = self.begin_pump()?;
        let events = self.shared.queue.poll();
        Ok(self.dispatch(events))
    }

    /// Blocks until at least one event or an empty wake arrives, then
    /// dispatches everything pending.
    pub fn wait_events(&self) -> Result<usize, EventLoopError> {
        let _guard = self.begin_pump()?;
        let events = self.shared.queue.wait(None);
        Ok(self.dispatch(events))
    }

    /// Like [`wait_events`](Self::wait_events), but gives up after `timeout`.
    pub fn wait_events_timeout(&self, timeout: Duration) -> Result<usize, EventLoopError> {
        let _guard = self.begin_pump()?;
        let events = self.shared.queue.wait(Some(timeout));
        Ok(self.dispatch(events))
    }

    /// Wakes the loop as if an event had arrived, without producing one.
    pub fn post_empty_event(&self) {
        self.shared.queue.wake();
    }

    pub fn create_waker(&self) -> EventLoopWaker {
        EventLoopWaker {
            waker: platform_impl::QueueWaker::new(Arc::clone(&self.shared.queue)),
        }
    }

    /// The connected monitors, primary first.
    pub fn monitors(&self) -> Vec<Monitor> {
        self.shared
            .platform
            .borrow()
            .connected_monitors()
            .into_iter()
            .map(|id| Monitor::new(Rc::clone(&self.shared.platform), id))
            .collect()
    }

    pub fn primary_monitor(&self) -> Option<Monitor> {
        self.shared
            .platform
            .borrow()
            .primary_monitor()
            .map(|id| Monitor::new(Rc::clone(&self.shared.platform), id))
    }

    /// Registers the monitor connect/disconnect callback, returning the
    /// previous one.
    pub fn set_monitor_callback(
        &self,
        callback: Option<MonitorCallback>,
    ) -> Option<MonitorCallback> {
        self.shared.monitor_callback.replace(callback)
    }

    /// Seconds since the event loop was created.
    pub fn time(&self) -> f64 {
        self.shared.started.elapsed().as_secs_f64()
    }

    /// The driver for simulated user and hardware actions.
    pub fn desktop(&self) -> Desktop {
        Desktop::new(Rc::clone(&self.shared.platform))
    }

    fn begin_pump(&self) -> Result<PumpGuard<'_>, EventLoopError> {
        if self.shared.pumping.replace(true) {
            // Already true; the outer pump's guard resets it.
            return Err(EventLoopError::AlreadyPumping);
        }
        Ok(PumpGuard(&self.shared.pumping))
    }

    fn dispatch(&self, events: Vec<platform_impl::Event>) -> usize {
        let mut delivered = 0;
        for event in events {
            delivered += usize::from(self.dispatch_one(event));
        }
        delivered
    }

    /// Builds a borrowed handle for a live window, or `None` if the id is
    /// stale.
    fn view_of(&self, id: WindowId) -> Option<Window<Data>> {
        let shared = self.shared.windows.borrow().get(id).map(Rc::clone)?;
        Some(Window::view(shared, Rc::clone(&self.shared)))
    }

    fn dispatch_one(&self, event: platform_impl::Event) -> bool {
        use platform_impl::Event;

        match event {
            Event::Moved { window, position } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.position.take_for_call() {
                    callback(&view, position);
                    view.shared.callbacks.position.restore(callback);
                }
            }
            Event::Resized { window, extent } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.size.take_for_call() {
                    callback(&view, extent);
                    view.shared.callbacks.size.restore(callback);
                }
            }
            Event::FramebufferResized { window, extent } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.framebuffer_size.take_for_call() {
                    callback(&view, extent);
                    view.shared.callbacks.framebuffer_size.restore(callback);
                }
            }
            Event::CloseRequested { window } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                // The flag is set before the callback so the callback can
                // veto the close by clearing it.
                view.shared.should_close.set(true);
                if let Some(mut callback) = view.shared.callbacks.close.take_for_call() {
                    callback(&view);
                    view.shared.callbacks.close.restore(callback);
                }
            }
            Event::Focused { window, focused } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.focus.take_for_call() {
                    callback(&view, focused);
                    view.shared.callbacks.focus.restore(callback);
                }
            }
            Event::Iconified { window, iconified } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.iconify.take_for_call() {
                    callback(&view, iconified);
                    view.shared.callbacks.iconify.restore(callback);
                }
            }
            Event::Damaged { window } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.refresh.take_for_call() {
                    callback(&view);
                    view.shared.callbacks.refresh.restore(callback);
                }
            }
            Event::CursorMoved { window, position } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.cursor_pos.take_for_call() {
                    callback(&view, position);
                    view.shared.callbacks.cursor_pos.restore(callback);
                }
            }
            Event::CursorEntered { window, entered } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.cursor_enter.take_for_call() {
                    callback(&view, entered);
                    view.shared.callbacks.cursor_enter.restore(callback);
                }
            }
            Event::MouseButton {
                window,
                button,
                state,
                modifiers,
            } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.mouse_button.take_for_call() {
                    callback(&view, button, state, modifiers);
                    view.shared.callbacks.mouse_button.restore(callback);
                }
            }
            Event::Key {
                window,
                key,
                state,
                modifiers,
            } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.key.take_for_call() {
                    callback(&view, key, state, modifiers);
                    view.shared.callbacks.key.restore(callback);
                }
            }
            Event::Scroll {
                window,
                axis,
                delta,
            } => {
                let Some(view) = self.view_of(window) else {
                    return false;
                };
                if let Some(mut callback) = view.shared.callbacks.scroll.take_for_call() {
                    callback(&view, axis, delta);
                    view.shared.callbacks.scroll.restore(callback);
                }
            }
            Event::MonitorConnected { monitor } => {
                let handle = Monitor::new(Rc::clone(&self.shared.platform), monitor);
                if let Some(mut callback) = self.shared.monitor_callback.take_for_call() {
                    callback(&handle, MonitorEvent::Connected);
                    self.shared.monitor_callback.restore(callback);
                }
            }
            Event::MonitorDisconnected { monitor } => {
                let handle = Monitor::new(Rc::clone(&self.shared.platform), monitor);
                if let Some(mut callback) = self.shared.monitor_callback.take_for_call() {
                    callback(&handle, MonitorEvent::Disconnected);
                    self.shared.monitor_callback.restore(callback);
                }
            }
        }

        true
    }
}

struct PumpGuard<'a>(&'a Cell<bool>);

impl Drop for PumpGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Wakes an [`EventLoop`] from any thread.
pub struct EventLoopWaker {
    waker: platform_impl::QueueWaker,
}

impl EventLoopWaker {
    /// Interrupts a blocking wait on the event loop.
    ///
    /// If no wait is in progress, the next one returns immediately instead.
    /// It is safe to call this after the event loop has been dropped; it
    /// just has no effect.
    pub fn wake(&self) {
        self.waker.wake();
    }
}

impl Clone for EventLoopWaker {
    fn clone(&self) -> Self {
        Self {
            waker: self.waker.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        geometry::{AspectRatio, WindowExtent, WindowPoint, WindowRect},
        system::{
            input::{ButtonState, KeyCode, ModifierKeys, MouseButton},
            monitor::VideoMode,
        },
        time::Hertz,
    };

    fn event_loop() -> EventLoop {
        EventLoop::new().unwrap()
    }

    #[test]
    fn callback_registration_returns_previous() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let first_calls = Rc::new(Cell::new(0));
        let second_calls = Rc::new(Cell::new(0));

        let previous = {
            let calls = Rc::clone(&first_calls);
            window.set_size_callback(Some(Box::new(move |_, _| calls.set(calls.get() + 1))))
        };
        assert!(previous.is_none());

        let previous = {
            let calls = Rc::clone(&second_calls);
            window.set_size_callback(Some(Box::new(move |_, _| calls.set(calls.get() + 1))))
        };
        assert!(previous.is_some());

        window.set_size(WindowExtent::new(1024, 768)).unwrap();
        event_loop.poll_events().unwrap();

        assert_eq!(first_calls.get(), 0);
        assert_eq!(second_calls.get(), 1);

        assert!(window.set_size_callback(None).is_some());
        window.set_size(WindowExtent::new(800, 600)).unwrap();
        event_loop.poll_events().unwrap();
        assert_eq!(second_calls.get(), 1);
    }

    #[test]
    fn callback_can_replace_itself() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = Rc::clone(&log);
            Box::new(move |view: &Window, _: WindowExtent| {
                log.borrow_mut().push("first");
                let log = Rc::clone(&log);
                let replaced = view.set_size_callback(Some(Box::new(move |_, _| {
                    log.borrow_mut().push("second");
                })));
                // The slot is empty while its callback runs.
                assert!(replaced.is_none());
            })
        };
        window.set_size_callback(Some(first));

        window.set_size(WindowExtent::new(1024, 768)).unwrap();
        event_loop.poll_events().unwrap();
        assert_eq!(*log.borrow(), ["first"]);

        window.set_size(WindowExtent::new(800, 600)).unwrap();
        event_loop.poll_events().unwrap();
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn resize_reports_size_before_framebuffer() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let log = Rc::clone(&log);
            window.set_size_callback(Some(Box::new(move |_, extent| {
                log.borrow_mut().push(format!("size {}x{}", extent.width, extent.height));
            })));
        }
        {
            let log = Rc::clone(&log);
            window.set_framebuffer_size_callback(Some(Box::new(move |_, extent| {
                log.borrow_mut()
                    .push(format!("framebuffer {}x{}", extent.width, extent.height));
            })));
        }

        window.set_size(WindowExtent::new(1024, 768)).unwrap();
        event_loop.poll_events().unwrap();

        assert_eq!(*log.borrow(), ["size 1024x768", "framebuffer 1024x768"]);
    }

    #[test]
    fn close_request_sets_flag_before_callback() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let saw_flag = Rc::new(Cell::new(false));
        {
            let saw_flag = Rc::clone(&saw_flag);
            window.set_close_callback(Some(Box::new(move |view| {
                saw_flag.set(view.should_close());
                // Veto the close.
                view.set_should_close(false);
            })));
        }

        event_loop.desktop().request_close(&window);
        event_loop.poll_events().unwrap();

        assert!(saw_flag.get());
        assert!(!window.should_close());
    }

    #[test]
    fn focus_reports_loss_before_gain() {
        let event_loop = event_loop();
        let first = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        let second = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, window) in [("first", &first), ("second", &second)] {
            let log = Rc::clone(&log);
            window.set_focus_callback(Some(Box::new(move |_, focused| {
                log.borrow_mut().push((name, focused));
            })));
        }

        assert!(second.is_focused());
        first.focus();
        event_loop.poll_events().unwrap();

        assert_eq!(*log.borrow(), [("second", false), ("first", true)]);
        assert!(first.is_focused());
        assert!(!second.is_focused());
    }

    #[test]
    fn destroyed_window_swallows_queued_events() {
        let event_loop = event_loop();
        let doomed = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        let survivor = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let calls = Rc::new(Cell::new(0));
        {
            let calls = Rc::clone(&calls);
            doomed.set_size_callback(Some(Box::new(move |_, _| calls.set(calls.get() + 1))));
        }

        doomed.set_size(WindowExtent::new(1024, 768)).unwrap();
        survivor.set_size(WindowExtent::new(1024, 768)).unwrap();
        doomed.destroy();

        let delivered = event_loop.poll_events().unwrap();

        assert_eq!(calls.get(), 0);
        // The survivor's events still arrive.
        assert!(delivered > 0);
        assert_eq!(survivor.size(), WindowExtent::new(1024, 768));
    }

    #[test]
    fn window_ids_are_not_reused() {
        let event_loop = event_loop();

        let first = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        let stale = first.id();
        first.destroy();

        let second = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        assert_ne!(second.id(), stale);
    }

    #[test]
    fn pumping_cannot_nest() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        let observed = Rc::new(Cell::new(false));
        {
            let observed = Rc::clone(&observed);
            window.set_close_callback(Some(Box::new(move |view: &Window| {
                let nested = EventLoop {
                    shared: Rc::clone(&view.context),
                };
                assert!(matches!(
                    nested.poll_events(),
                    Err(EventLoopError::AlreadyPumping)
                ));
                observed.set(true);
            })));
        }

        event_loop.desktop().request_close(&window);
        event_loop.poll_events().unwrap();
        assert!(observed.get());

        // The guard reset the flag; pumping works again.
        event_loop.poll_events().unwrap();
    }

    #[test]
    fn wait_with_timeout_returns_zero_when_idle() {
        let event_loop = event_loop();

        let start = Instant::now();
        let delivered = event_loop
            .wait_events_timeout(Duration::from_millis(10))
            .unwrap();

        assert_eq!(delivered, 0);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn waker_interrupts_wait_from_another_thread() {
        let event_loop = event_loop();
        let waker = event_loop.create_waker();

        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            waker.wake();
        });

        let delivered = event_loop.wait_events().unwrap();
        thread.join().unwrap();

        assert_eq!(delivered, 0);
    }

    #[test]
    fn post_empty_event_wakes_the_next_wait() {
        let event_loop = event_loop();

        event_loop.post_empty_event();
        let start = Instant::now();
        let delivered = event_loop
            .wait_events_timeout(Duration::from_secs(5))
            .unwrap();

        assert_eq!(delivered, 0);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn attributes_shape_the_window() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title("game")
                    .with_size(WindowExtent::new(640, 480))
                    .with_position(WindowPoint::new(10, 20))
                    .with_resizability(false)
                    .with_floating(true),
            )
            .unwrap();

        assert_eq!(window.title(), "game");
        assert_eq!(window.size(), WindowExtent::new(640, 480));
        assert_eq!(window.position(), WindowPoint::new(10, 20));
        assert!(!window.is_resizable());
        assert!(window.is_floating());
        assert!(window.is_visible());

        // Not resizable applies to user resizes, not programmatic ones.
        event_loop
            .desktop()
            .drag_resize(&window, WindowExtent::new(1000, 1000));
        assert_eq!(window.size(), WindowExtent::new(640, 480));

        window.set_size(WindowExtent::new(800, 600)).unwrap();
        assert_eq!(window.size(), WindowExtent::new(800, 600));
    }

    #[test]
    fn hidden_windows_do_not_take_focus() {
        let event_loop = event_loop();
        let visible = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        let hidden = event_loop
            .create_window(WindowAttributes::default().with_visibility(false))
            .unwrap();

        assert!(visible.is_focused());
        assert!(!hidden.is_visible());
        assert!(!hidden.is_focused());

        hidden.focus();
        assert!(!hidden.is_focused());

        hidden.show();
        assert!(hidden.is_focused());
        assert!(!visible.is_focused());
    }

    #[test]
    fn size_limits_clamp_current_and_future_sizes() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default().with_size(WindowExtent::new(800, 600)))
            .unwrap();

        window
            .set_size_limits(
                Some(WindowExtent::new(400, 300)),
                Some(WindowExtent::new(640, 480)),
            )
            .unwrap();
        // The current size was outside the new limits.
        assert_eq!(window.size(), WindowExtent::new(640, 480));

        window.set_size(WindowExtent::new(100, 100)).unwrap();
        assert_eq!(window.size(), WindowExtent::new(400, 300));

        assert!(matches!(
            window.set_size_limits(
                Some(WindowExtent::new(800, 600)),
                Some(WindowExtent::new(640, 480))
            ),
            Err(WindowError::InvalidSizeLimits)
        ));
    }

    #[test]
    fn aspect_ratio_constrains_resizes() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(WindowAttributes::default().with_size(WindowExtent::new(800, 600)))
            .unwrap();

        window
            .set_aspect_ratio(Some(AspectRatio::new(16, 9)))
            .unwrap();
        assert_eq!(window.size(), WindowExtent::new(800, 450));

        window.set_size(WindowExtent::new(1920, 1)).unwrap();
        assert_eq!(window.size(), WindowExtent::new(1920, 1080));

        window.set_aspect_ratio(None).unwrap();
        window.set_size(WindowExtent::new(500, 500)).unwrap();
        assert_eq!(window.size(), WindowExtent::new(500, 500));
    }

    #[test]
    fn iconify_maximize_restore_transitions() {
        let event_loop = event_loop();
        let monitor = event_loop.primary_monitor().unwrap();
        let window = event_loop
            .create_window(WindowAttributes::default().with_size(WindowExtent::new(640, 480)))
            .unwrap();

        window.maximize();
        assert!(window.is_maximized());
        assert_eq!(window.size(), monitor.extent());

        window.iconify();
        assert!(window.is_iconified());
        assert!(!window.is_focused());

        // The first restore un-iconifies, the second un-maximizes.
        window.restore();
        assert!(!window.is_iconified());
        assert!(window.is_maximized());

        window.restore();
        assert!(!window.is_maximized());
        assert_eq!(window.size(), WindowExtent::new(640, 480));
    }

    #[test]
    fn fullscreen_round_trip() {
        let config = Config {
            monitors: vec![MonitorConfig::default()
                .with_mode(VideoMode::new(WindowExtent::new(1280, 720), Hertz(60.0)))],
        };
        let event_loop = EventLoop::<()>::with_config(config).unwrap();
        let monitor = event_loop.primary_monitor().unwrap();

        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_size(WindowExtent::new(640, 480))
                    .with_position(WindowPoint::new(50, 60)),
            )
            .unwrap();

        window.set_fullscreen(&monitor, None).unwrap();
        assert_eq!(window.monitor(), Some(monitor.clone()));
        assert_eq!(window.size(), monitor.extent());
        assert_eq!(window.frame_insets(), crate::geometry::FrameInsets::ZERO);

        // Resizing a fullscreen window snaps to the closest video mode.
        window.set_size(WindowExtent::new(1300, 700)).unwrap();
        assert_eq!(window.size(), WindowExtent::new(1280, 720));

        window
            .set_windowed(WindowRect::new(50, 60, 640, 480))
            .unwrap();
        assert_eq!(window.monitor(), None);
        assert_eq!(window.size(), WindowExtent::new(640, 480));
        assert_eq!(window.position(), WindowPoint::new(50, 60));
    }

    #[test]
    fn fullscreen_auto_iconifies_when_unfocused() {
        let event_loop = event_loop();
        let monitor = event_loop.primary_monitor().unwrap();

        let fullscreen = event_loop
            .create_window(WindowAttributes::default().with_fullscreen(&monitor))
            .unwrap();
        event_loop.poll_events().unwrap();

        let iconified = Rc::new(Cell::new(false));
        {
            let iconified = Rc::clone(&iconified);
            fullscreen.set_iconify_callback(Some(Box::new(move |_, state| iconified.set(state))));
        }

        let _other = event_loop
            .create_window(WindowAttributes::default())
            .unwrap();
        event_loop.poll_events().unwrap();

        assert!(fullscreen.is_iconified());
        assert!(iconified.get());
    }

    #[test]
    fn foreign_monitors_are_rejected() {
        let first = event_loop();
        let second = event_loop();

        let foreign = second.primary_monitor().unwrap();
        let window = first.create_window(WindowAttributes::default()).unwrap();

        assert!(matches!(
            window.set_fullscreen(&foreign, None),
            Err(WindowError::ForeignMonitor)
        ));
        assert!(matches!(
            first.create_window(WindowAttributes::default().with_fullscreen(&foreign)),
            Err(WindowError::ForeignMonitor)
        ));
    }

    #[test]
    fn monitor_hotplug_reaches_the_callback() {
        let event_loop = event_loop();
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let log = Rc::clone(&log);
            event_loop.set_monitor_callback(Some(Box::new(move |monitor, event| {
                log.borrow_mut().push((monitor.name(), event));
            })));
        }

        let second = event_loop
            .desktop()
            .connect_monitor(MonitorConfig::default().with_name("Side Display"))
            .unwrap();
        assert_eq!(event_loop.monitors().len(), 2);

        event_loop.desktop().disconnect_monitor(&second);
        assert_eq!(event_loop.monitors().len(), 1);
        assert!(!second.is_connected());
        // Tombstoned handles still answer queries.
        assert_eq!(second.name(), "Side Display");

        event_loop.poll_events().unwrap();
        assert_eq!(
            *log.borrow(),
            [
                ("Side Display".to_string(), MonitorEvent::Connected),
                ("Side Display".to_string(), MonitorEvent::Disconnected)
            ]
        );
    }

    #[test]
    fn window_data_is_shared_with_callbacks() {
        let event_loop = EventLoop::<Vec<&'static str>>::new().unwrap();
        let window = event_loop
            .create_window_with(WindowAttributes::default(), vec!["created"])
            .unwrap();
        event_loop.poll_events().unwrap();

        window.set_size_callback(Some(Box::new(|view, _| {
            view.data_mut().push("resized");
        })));

        window.set_size(WindowExtent::new(1024, 768)).unwrap();
        event_loop.poll_events().unwrap();

        assert_eq!(*window.data(), ["created", "resized"]);
        let taken = window.replace_data(Vec::new());
        assert_eq!(taken, ["created", "resized"]);
        assert!(window.data().is_empty());
    }

    #[test]
    fn input_reaches_focused_and_hovered_windows() {
        let event_loop = event_loop();
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_position(WindowPoint::new(100, 100))
                    .with_size(WindowExtent::new(400, 300)),
            )
            .unwrap();
        event_loop.poll_events().unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = Rc::clone(&log);
            window.set_cursor_enter_callback(Some(Box::new(move |_, entered| {
                log.borrow_mut().push(if entered { "enter" } else { "leave" });
            })));
        }
        {
            let log = Rc::clone(&log);
            window.set_cursor_pos_callback(Some(Box::new(move |_, _| {
                log.borrow_mut().push("move");
            })));
        }
        {
            let log = Rc::clone(&log);
            window.set_key_callback(Some(Box::new(move |_, _, _, _| {
                log.borrow_mut().push("key");
            })));
        }
        {
            let log = Rc::clone(&log);
            window.set_mouse_button_callback(Some(Box::new(move |_, _, _, _| {
                log.borrow_mut().push("button");
            })));
        }

        let desktop = event_loop.desktop();
        desktop.move_cursor(WindowPoint::new(150, 130));
        desktop.mouse_button(MouseButton::Left, ButtonState::Pressed, ModifierKeys::CTRL);
        desktop.key(KeyCode::Space, ButtonState::Pressed, ModifierKeys::empty());
        desktop.move_cursor(WindowPoint::new(1000, 1000));
        event_loop.poll_events().unwrap();

        assert_eq!(*log.borrow(), ["enter", "move", "button", "key", "leave"]);
        assert_eq!(window.cursor_position(), None);
        assert_eq!(window.key_state(KeyCode::Space), ButtonState::Pressed);
        assert_eq!(
            window.mouse_button_state(MouseButton::Left),
            ButtonState::Pressed
        );
    }

    #[test]
    fn time_advances() {
        let event_loop = event_loop();

        let before = event_loop.time();
        std::thread::sleep(Duration::from_millis(5));
        let after = event_loop.time();

        assert!(after > before);
    }

    #[test]
    fn rejects_empty_monitor_config() {
        let result = EventLoop::<()>::with_config(Config {
            monitors: Vec::new(),
        });
        assert!(matches!(result, Err(EventLoopError::NoMonitors)));
    }
}
