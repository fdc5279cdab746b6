use std::collections::BTreeMap;

use crate::keys::{HeldKeys, Key};

/// What a key means to the shell.
///
/// The shell consumes actions, never raw keys, so rebinding is a table
/// change rather than a code change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the render loop.
    Quit,
    /// Recompile the shader program from its source files.
    RebuildShader,
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Speed multiplier while held.
    Boost,
}

impl Action {
    /// Discrete actions fire once per press; the rest are sampled every frame
    /// while held.
    pub fn is_discrete(self) -> bool {
        matches!(self, Action::Quit | Action::RebuildShader)
    }
}

/// Per-frame movement intent, one signed unit per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Movement {
    pub forward: f32,
    pub right: f32,
    pub up: f32,
    pub boost: bool,
}

impl Movement {
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.right == 0.0 && self.up == 0.0
    }
}

/// Key to action table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: BTreeMap<Key, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let map = BTreeMap::from([
            (Key::Escape, Action::Quit),
            (Key::Digit0, Action::RebuildShader),
            (Key::KeyW, Action::MoveForward),
            (Key::KeyS, Action::MoveBackward),
            (Key::KeyA, Action::MoveLeft),
            (Key::KeyD, Action::MoveRight),
            (Key::Space, Action::MoveUp),
            (Key::ControlLeft, Action::MoveDown),
            (Key::ShiftLeft, Action::Boost),
        ]);
        Self { map }
    }
}

impl KeyBindings {
    /// A table with nothing bound.
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, key: Key, action: Action) -> Option<Action> {
        self.map.insert(key, action)
    }

    pub fn action(&self, key: Key) -> Option<Action> {
        self.map.get(&key).copied()
    }

    fn held(&self, keys: &HeldKeys, action: Action) -> bool {
        self.map
            .iter()
            .any(|(key, bound)| *bound == action && keys.is_down(*key))
    }

    /// Movement intent from the keys currently held. Opposing keys cancel.
    pub fn movement(&self, keys: &HeldKeys) -> Movement {
        let axis = |pos: Action, neg: Action| {
            let mut v = 0.0;
            if self.held(keys, pos) {
                v += 1.0;
            }
            if self.held(keys, neg) {
                v -= 1.0;
            }
            v
        };
        Movement {
            forward: axis(Action::MoveForward, Action::MoveBackward),
            right: axis(Action::MoveRight, Action::MoveLeft),
            up: axis(Action::MoveUp, Action::MoveDown),
            boost: self.held(keys, Action::Boost),
        }
    }
}
