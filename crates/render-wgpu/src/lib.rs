//! wgpu render backend for the quadshade shell.
//!
//! Shaders are GLSL, compiled through naga on the CPU before any GPU object
//! is created, so compile errors and uniform layouts are available without a
//! device (see [`compile_program`]). The backend turns a compiled program into
//! a render pipeline plus a uniform buffer mirroring the shader's block.
//!
//! # Invariants
//! - All non-opaque uniforms live in one std140 block at set 0, binding 0.
//! - Pipeline creation runs inside a validation error scope; failures come
//!   back as [`ShaderError::Link`](quadshade_render::ShaderError::Link),
//!   never as a panic from the uncaptured-error handler.

mod compile;
mod gpu;
mod program;
mod reflect;
mod shaders;

pub use compile::{CompiledProgram, compile_program, compile_source};
pub use gpu::{InitError, WgpuBackend};
pub use program::WgpuShaderProgram;
pub use reflect::{UniformField, UniformLayout, UniformStaging};
pub use shaders::{FALLBACK_FRAGMENT, FALLBACK_VERTEX};
