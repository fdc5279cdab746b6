use quadshade_common::Resolution;

use crate::program::{ShaderError, ShaderProgram, ShaderSources};

/// Fatal errors from presenting a frame. Transient surface trouble is
/// reported as [`FrameOutcome::Skipped`] instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// Nothing was drawn this frame (surface lost, outdated, or zero-sized).
    Skipped,
}

/// GPU backend interface. The shell is generic over this trait, so it runs
/// against a recording fake in tests and against wgpu on the desktop.
pub trait RenderBackend {
    type Program: ShaderProgram;

    /// Compile and link a program from source files.
    fn build_program(&mut self, sources: &ShaderSources) -> Result<Self::Program, ShaderError>;

    /// A built-in program that needs no files, used when the user's shader
    /// cannot be built at startup.
    fn fallback_program(&mut self) -> Result<Self::Program, ShaderError>;

    /// React to a new surface size (reconfigure the viewport/swapchain).
    fn resize(&mut self, size: Resolution);

    /// Current surface size in pixels.
    fn size(&self) -> Resolution;

    /// Clear to `clear_color`, bind `program` with its current uniform
    /// values, draw the full-screen quad and present.
    fn draw_frame(
        &mut self,
        program: &mut Self::Program,
        clear_color: [f32; 4],
    ) -> Result<FrameOutcome, RenderError>;
}
