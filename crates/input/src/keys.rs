use std::collections::HashSet;

/// Keys the shell cares about. Anything else is dropped by the windowing
/// layer before it reaches the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Escape,
    Digit0,
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    Space,
    ControlLeft,
    ShiftLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Set of currently held keys.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    down: HashSet<Key>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition. Returns `true` on a press edge (the key was
    /// not already held), which is when discrete actions should fire.
    pub fn apply(&mut self, key: Key, state: KeyState) -> bool {
        match state {
            KeyState::Pressed => self.down.insert(key),
            KeyState::Released => {
                self.down.remove(&key);
                false
            }
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    pub fn clear(&mut self) {
        self.down.clear();
    }

    pub fn len(&self) -> usize {
        self.down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.down.is_empty()
    }
}
