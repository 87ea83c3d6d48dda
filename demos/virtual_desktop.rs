use sill::{
    geometry::{WindowExtent, WindowPoint, WindowRect},
    system::{
        input::{ButtonState, KeyCode, ModifierKeys},
        monitor::MonitorConfig,
    },
    Config, EventLoop, Window, WindowAttributes,
};

fn main() {
    tracing_subscriber::fmt::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let event_loop = EventLoop::<()>::with_config(Config {
        monitors: vec![
            MonitorConfig::default().with_name("Main Display"),
            MonitorConfig::default()
                .with_name("Side Display")
                .with_position(WindowPoint::new(1920, 0))
                .with_extent(WindowExtent::new(1280, 1024)),
        ],
    })
    .unwrap();

    event_loop.set_monitor_callback(Some(Box::new(|monitor, event| {
        tracing::info!("monitor {}: {:?}", monitor.name(), event);
    })));

    let window = event_loop
        .create_window(
            WindowAttributes::default()
                .with_title("Tour")
                .with_size(WindowExtent::new(800, 600)),
        )
        .unwrap();
    window.set_key_callback(Some(Box::new(
        |_: &Window, key, state: ButtonState, _modifiers| {
            tracing::info!("key {:?} {:?}", key, state);
        },
    )));
    window.set_position_callback(Some(Box::new(|_: &Window, position| {
        tracing::info!("moved to {:?}", position);
    })));

    let desktop = event_loop.desktop();

    // Fullscreen on the side monitor, then yank its cable.
    let side = event_loop.monitors().into_iter().nth(1).unwrap();
    window.set_fullscreen(&side, None).unwrap();
    event_loop.poll_events().unwrap();
    tracing::info!("fullscreen size: {:?}", window.size());

    desktop.disconnect_monitor(&side);
    event_loop.poll_events().unwrap();
    tracing::info!(
        "back to windowed: {:?} at {:?}",
        window.size(),
        window.position()
    );

    // Plug in a replacement and move the window onto it by hand.
    let replacement = desktop
        .connect_monitor(
            MonitorConfig::default()
                .with_name("Replacement Display")
                .with_position(WindowPoint::new(1920, 0)),
        )
        .unwrap();
    window
        .set_windowed(WindowRect::at(
            replacement.position(),
            WindowExtent::new(800, 600),
        ))
        .unwrap();
    event_loop.poll_events().unwrap();

    // Type at it.
    desktop.key(KeyCode::H, ButtonState::Pressed, ModifierKeys::empty());
    desktop.key(KeyCode::H, ButtonState::Released, ModifierKeys::empty());
    desktop.key(KeyCode::I, ButtonState::Pressed, ModifierKeys::SHIFT);
    desktop.key(KeyCode::I, ButtonState::Released, ModifierKeys::SHIFT);
    event_loop.poll_events().unwrap();
}
