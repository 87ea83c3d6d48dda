use sill::{geometry::WindowExtent, EventLoop, Window, WindowAttributes};

fn main() {
    tracing_subscriber::fmt::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let event_loop = EventLoop::<()>::new().unwrap();

    let window = event_loop
        .create_window(
            WindowAttributes::default()
                .with_title("Hello, world!")
                .with_size(WindowExtent::new(800, 600)),
        )
        .unwrap();

    window.set_size_callback(Some(Box::new(|_: &Window, extent| {
        tracing::info!("resized to {:?}", extent);
    })));
    window.set_close_callback(Some(Box::new(|_: &Window| {
        tracing::info!("close requested");
    })));

    // A scripted user stands in for a real one.
    let desktop = event_loop.desktop();
    desktop.drag_resize(&window, WindowExtent::new(1024, 768));
    desktop.request_close(&window);

    while !window.should_close() {
        event_loop.wait_events().unwrap();
    }

    tracing::info!("goodbye");
}
