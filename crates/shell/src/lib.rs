//! Application core for the quadshade shell.
//!
//! [`Application`] owns the camera, frame clock, key state, the render
//! backend and the current shader program. It knows nothing about windows:
//! a windowing layer feeds it [`InputEvent`](quadshade_input::InputEvent)s
//! and calls [`Application::frame`] once per redraw.
//!
//! # Invariants
//! - After initialization there is always exactly one usable program.
//! - Every presented frame uploads the full uniform contract.
//! - Delta time is never negative and is the real gap between frames.

mod app;
mod clock;
mod slot;

pub use app::{Application, Phase, ShellError};
pub use clock::{FrameClock, FrameTime};
pub use slot::ProgramSlot;
