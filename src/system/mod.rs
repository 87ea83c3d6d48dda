pub mod callbacks;
pub mod event_loop;
pub mod icon;
pub mod input;
pub mod monitor;
pub mod window;

#[path = "headless/mod.rs"]
mod platform_impl;

pub use platform_impl::{
    desktop::{Desktop, Screenshot},
    Framebuffer,
};
