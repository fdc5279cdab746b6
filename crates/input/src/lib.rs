//! Input layer: platform-agnostic events mapped to shell actions.
//!
//! The windowing layer translates OS events into [`InputEvent`]s and feeds
//! them through an [`EventSource`]. The shell never sees windowing types,
//! so it can be driven by an [`EventQueue`] in tests.
//!
//! # Invariants
//! - Discrete actions fire on press edges only, never on key repeat.
//! - Held-key state is cleared when the window loses focus.

pub mod action;
pub mod event;
pub mod keys;

pub use action::{Action, KeyBindings, Movement};
pub use event::{EventQueue, EventSource, InputEvent};
pub use keys::{HeldKeys, Key, KeyState};
