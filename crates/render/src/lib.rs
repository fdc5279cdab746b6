//! Rendering adapter: everything the shell needs from a GPU backend, with no
//! GPU types.
//!
//! # Invariants
//! - The quad mesh is fixed: 4 vertices, 6 indices, 2 triangles.
//! - Uniform names are fixed by [`uniforms::names`]; shaders opt in by
//!   declaring them.
//! - A backend draw always goes through a compiled [`ShaderProgram`].
//!
//! # Workaround
//! Shader "use" has no direct equivalent on a pipeline-based API. A program
//! becomes active by being handed to [`RenderBackend::draw_frame`].

mod camera;
mod program;
mod quad;
mod renderer;
pub mod uniforms;

pub use camera::FlyCamera;
pub use program::{ShaderError, ShaderProgram, ShaderSources, ShaderStage, UniformKind, UniformValue};
pub use quad::{QUAD_INDEX_COUNT, QUAD_INDICES, QUAD_VERTICES, QuadVertex};
pub use renderer::{FrameOutcome, RenderBackend, RenderError};
pub use uniforms::FrameUniforms;
