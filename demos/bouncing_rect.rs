use sill::{geometry::WindowExtent, EventLoop, WindowAttributes};

const BACKGROUND: u32 = 0xff202020;
const FOREGROUND: u32 = 0xffe0a030;
const RECT_SIZE: i32 = 48;

fn main() {
    tracing_subscriber::fmt::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let event_loop = EventLoop::<()>::new().unwrap();
    let window = event_loop
        .create_window(
            WindowAttributes::default()
                .with_title("Bouncing rect")
                .with_size(WindowExtent::new(640, 480)),
        )
        .unwrap();

    let (mut x, mut y) = (10, 10);
    let (mut dx, mut dy) = (7, 5);

    for _frame in 0..240 {
        let extent = window.framebuffer_size();

        x += dx;
        y += dy;
        if x <= 0 || x + RECT_SIZE >= extent.width {
            dx = -dx;
        }
        if y <= 0 || y + RECT_SIZE >= extent.height {
            dy = -dy;
        }

        {
            let mut framebuffer = window.framebuffer();
            framebuffer.fill(BACKGROUND);
            for row in y..y + RECT_SIZE {
                for column in x..x + RECT_SIZE {
                    framebuffer.put(column, row, FOREGROUND);
                }
            }
        }
        window.swap_buffers();

        event_loop.poll_events().unwrap();
    }

    let desktop = event_loop.desktop();
    let screenshot = desktop.screenshot(&window);
    tracing::info!(
        "presented {} frames, rect at ({}, {}) = {:#010x}",
        desktop.present_count(&window),
        x + RECT_SIZE / 2,
        y + RECT_SIZE / 2,
        screenshot.pixel(x + RECT_SIZE / 2, y + RECT_SIZE / 2)
    );
}
