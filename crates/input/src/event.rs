use std::collections::VecDeque;

use crate::keys::{Key, KeyState};

/// A windowing event, stripped of any platform types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { key: Key, state: KeyState },
    /// Absolute cursor position. With the cursor captured this is a virtual
    /// position that keeps accumulating past the window edges.
    PointerMoved { x: f64, y: f64 },
    /// New surface size in physical pixels.
    Resized { width: u32, height: u32 },
    FocusLost,
    CloseRequested,
}

impl InputEvent {
    pub fn key_pressed(key: Key) -> Self {
        Self::Key {
            key,
            state: KeyState::Pressed,
        }
    }

    pub fn key_released(key: Key) -> Self {
        Self::Key {
            key,
            state: KeyState::Released,
        }
    }
}

/// Something that yields input events gathered since the last frame.
pub trait EventSource {
    /// Next pending event, or `None` once the source is drained for this frame.
    fn next_event(&mut self) -> Option<InputEvent>;
}

/// FIFO event source. The desktop app pushes translated OS events into it
/// between frames; tests push events directly.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl EventSource for EventQueue {
    fn next_event(&mut self) -> Option<InputEvent> {
        self.pending.pop_front()
    }
}

impl Extend<InputEvent> for EventQueue {
    fn extend<T: IntoIterator<Item = InputEvent>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}
