//! Per-window callback storage.
//!
//! Each event kind has exactly one slot. Installing a callback replaces the
//! slot's contents and hands the previous callback back to the caller.
//!
//! Dispatch takes the callback out of its slot before invoking it and puts it
//! back afterwards only if the slot is still empty. A callback that replaces
//! itself mid-call therefore wins over the restore, and a callback can never
//! be re-entered through its own slot.

use std::cell::RefCell;

use crate::geometry::{FramebufferExtent, WindowExtent, WindowPoint};

use super::{
    input::{ButtonState, KeyCode, ModifierKeys, MouseButton, ScrollAxis},
    window::Window,
};

pub type SizeCallback<Data> = Box<dyn FnMut(&Window<Data>, WindowExtent)>;
pub type PositionCallback<Data> = Box<dyn FnMut(&Window<Data>, WindowPoint)>;
pub type CloseCallback<Data> = Box<dyn FnMut(&Window<Data>)>;
pub type FocusCallback<Data> = Box<dyn FnMut(&Window<Data>, bool)>;
pub type IconifyCallback<Data> = Box<dyn FnMut(&Window<Data>, bool)>;
pub type RefreshCallback<Data> = Box<dyn FnMut(&Window<Data>)>;
pub type FramebufferSizeCallback<Data> = Box<dyn FnMut(&Window<Data>, FramebufferExtent)>;
pub type KeyCallback<Data> = Box<dyn FnMut(&Window<Data>, KeyCode, ButtonState, ModifierKeys)>;
pub type MouseButtonCallback<Data> =
    Box<dyn FnMut(&Window<Data>, MouseButton, ButtonState, ModifierKeys)>;
pub type CursorPosCallback<Data> = Box<dyn FnMut(&Window<Data>, WindowPoint)>;
pub type CursorEnterCallback<Data> = Box<dyn FnMut(&Window<Data>, bool)>;
pub type ScrollCallback<Data> = Box<dyn FnMut(&Window<Data>, ScrollAxis, f32)>;

pub(crate) struct Slot<F: ?Sized>(RefCell<Option<Box<F>>>);

impl<F: ?Sized> Slot<F> {
    pub fn new() -> Self {
        Self(RefCell::new(None))
    }

    pub fn replace(&self, callback: Option<Box<F>>) -> Option<Box<F>> {
        self.0.replace(callback)
    }

    /// Removes the callback for the duration of a call so that dispatch never
    /// aliases the slot while user code runs.
    pub fn take_for_call(&self) -> Option<Box<F>> {
        self.0.borrow_mut().take()
    }

    /// Puts a callback taken with [`take_for_call`](Self::take_for_call) back,
    /// unless the call installed a replacement in the meantime.
    pub fn restore(&self, callback: Box<F>) {
        let mut slot = self.0.borrow_mut();
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

pub(crate) struct WindowCallbacks<Data> {
    pub size: Slot<dyn FnMut(&Window<Data>, WindowExtent)>,
    pub position: Slot<dyn FnMut(&Window<Data>, WindowPoint)>,
    pub close: Slot<dyn FnMut(&Window<Data>)>,
    pub focus: Slot<dyn FnMut(&Window<Data>, bool)>,
    pub iconify: Slot<dyn FnMut(&Window<Data>, bool)>,
    pub refresh: Slot<dyn FnMut(&Window<Data>)>,
    pub framebuffer_size: Slot<dyn FnMut(&Window<Data>, FramebufferExtent)>,
    pub key: Slot<dyn FnMut(&Window<Data>, KeyCode, ButtonState, ModifierKeys)>,
    pub mouse_button: Slot<dyn FnMut(&Window<Data>, MouseButton, ButtonState, ModifierKeys)>,
    pub cursor_pos: Slot<dyn FnMut(&Window<Data>, WindowPoint)>,
    pub cursor_enter: Slot<dyn FnMut(&Window<Data>, bool)>,
    pub scroll: Slot<dyn FnMut(&Window<Data>, ScrollAxis, f32)>,
}

impl<Data> WindowCallbacks<Data> {
    pub fn new() -> Self {
        Self {
            size: Slot::new(),
            position: Slot::new(),
            close: Slot::new(),
            focus: Slot::new(),
            iconify: Slot::new(),
            refresh: Slot::new(),
            framebuffer_size: Slot::new(),
            key: Slot::new(),
            mouse_button: Slot::new(),
            cursor_pos: Slot::new(),
            cursor_enter: Slot::new(),
            scroll: Slot::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn replace_returns_previous() {
        let slot: Slot<dyn FnMut(&(), i32)> = Slot::new();

        assert!(slot.replace(Some(Box::new(|_, _| {}))).is_none());

        let previous = slot.replace(Some(Box::new(|_, _| {})));
        assert!(previous.is_some());

        let previous = slot.replace(None);
        assert!(previous.is_some());
        assert!(slot.replace(None).is_none());
    }

    #[test]
    fn take_empties_slot() {
        let slot: Slot<dyn FnMut(&(), i32)> = Slot::new();
        slot.replace(Some(Box::new(|_, _| {})));

        assert!(slot.take_for_call().is_some());
        assert!(slot.take_for_call().is_none());
    }

    #[test]
    fn restore_yields_to_replacement() {
        let called = Rc::new(Cell::new(0));

        let slot: Slot<dyn FnMut(&(), i32)> = Slot::new();
        slot.replace(Some(Box::new(|_, _| {})));

        let taken = slot.take_for_call().unwrap();

        // A replacement installed while the callback is out keeps the slot.
        let counter = Rc::clone(&called);
        slot.replace(Some(Box::new(move |_, v| counter.set(v))));
        slot.restore(taken);

        let mut current = slot.take_for_call().unwrap();
        current(&(), 7);
        assert_eq!(called.get(), 7);
    }

    #[test]
    fn restore_refills_empty_slot() {
        let slot: Slot<dyn FnMut(&(), i32)> = Slot::new();
        slot.replace(Some(Box::new(|_, _| {})));

        let taken = slot.take_for_call().unwrap();
        slot.restore(taken);

        assert!(slot.take_for_call().is_some());
    }
}
