use quadshade_render::{ShaderProgram, UniformKind, UniformValue};

use crate::reflect::UniformStaging;

/// GPU side of a uniform block: the buffer and the bind group exposing it at
/// set 0, binding 0.
pub(crate) struct UniformBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// A linked program: render pipeline plus its uniform block.
///
/// Setters only touch the CPU staging copy; the backend uploads it right
/// before the draw that uses this program.
pub struct WgpuShaderProgram {
    label: String,
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) uniforms: Option<(UniformStaging, UniformBinding)>,
}

impl WgpuShaderProgram {
    pub(crate) fn new(
        label: String,
        pipeline: wgpu::RenderPipeline,
        uniforms: Option<(UniformStaging, UniformBinding)>,
    ) -> Self {
        Self {
            label,
            pipeline,
            uniforms,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Names of all settable uniforms, sorted.
    pub fn uniform_names(&self) -> Vec<&str> {
        self.uniforms
            .as_ref()
            .map(|(staging, _)| staging.layout().fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Copy the staging block into the GPU buffer.
    pub(crate) fn flush(&self, queue: &wgpu::Queue) {
        if let Some((staging, binding)) = &self.uniforms {
            queue.write_buffer(&binding.buffer, 0, staging.bytes());
        }
    }

    pub(crate) fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.uniforms.as_ref().map(|(_, binding)| &binding.bind_group)
    }
}

impl ShaderProgram for WgpuShaderProgram {
    fn uniform_kind(&self, name: &str) -> Option<UniformKind> {
        let (staging, _) = self.uniforms.as_ref()?;
        staging.layout().get(name).map(|field| field.kind)
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        match &mut self.uniforms {
            Some((staging, _)) => {
                staging.set(name, value);
            }
            None => {
                tracing::trace!(uniform = name, "program has no uniform block, skipped");
            }
        }
    }
}

impl std::fmt::Debug for WgpuShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuShaderProgram")
            .field("label", &self.label)
            .field("uniforms", &self.uniform_names())
            .finish()
    }
}
