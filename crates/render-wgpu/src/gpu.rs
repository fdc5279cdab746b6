use quadshade_common::Resolution;
use quadshade_render::{
    FrameOutcome, QUAD_INDEX_COUNT, QUAD_INDICES, QUAD_VERTICES, QuadVertex, RenderBackend,
    RenderError, ShaderError, ShaderSources, ShaderStage,
};
use std::borrow::Cow;
use std::path::Path;
use wgpu::util::DeviceExt;

use crate::compile::{CompiledProgram, compile_program, compile_source, link};
use crate::program::{UniformBinding, WgpuShaderProgram};
use crate::reflect::UniformStaging;
use crate::shaders::{FALLBACK_FRAGMENT, FALLBACK_VERTEX};

/// Errors from bringing up the GPU. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// wgpu device, surface, and the static quad.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: Resolution,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

impl WgpuBackend {
    /// Create a surface for `target`, pick an adapter and device, and upload
    /// the quad. `size` is the target's current size in pixels.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: Resolution,
    ) -> Result<Self, InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(InitError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("quadshade_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let info = adapter.get_info();
        tracing::info!(
            "using GPU: {} ({} backend)",
            info.name,
            info.backend.to_str()
        );

        // Shaders write display values directly, as into a default GL
        // framebuffer, so prefer a non-sRGB format.
        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(InitError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if !size.is_empty() {
            surface.configure(&device, &config);
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_index_buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            vertex_buffer,
            index_buffer,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Turn a compiled program into a pipeline. Any wgpu validation error is
    /// captured and returned as a link error.
    fn create_program(
        &self,
        label: &str,
        compiled: CompiledProgram,
    ) -> Result<WgpuShaderProgram, ShaderError> {
        let device = &self.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_vertex"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(compiled.vertex)),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_fragment"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(compiled.fragment)),
        });

        let uniforms = compiled.uniforms.map(|layout| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("uniform_buffer"),
                size: layout.buffer_size(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("uniform_bind_group_layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform_bind_group"),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (
                UniformStaging::new(layout),
                UniformBinding { buffer, bind_group },
                bind_group_layout,
            )
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            uniforms.iter().map(|(_, _, layout)| layout).collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Link {
                message: err.to_string(),
            });
        }

        let uniforms = uniforms.map(|(staging, binding, _)| (staging, binding));
        let program = WgpuShaderProgram::new(label.to_string(), pipeline, uniforms);
        tracing::debug!(?program, "created shader program");
        Ok(program)
    }
}

impl RenderBackend for WgpuBackend {
    type Program = WgpuShaderProgram;

    fn build_program(&mut self, sources: &ShaderSources) -> Result<WgpuShaderProgram, ShaderError> {
        let compiled = compile_program(sources)?;
        let label = format!(
            "{} + {}",
            sources.vertex.display(),
            sources.fragment.display()
        );
        self.create_program(&label, compiled)
    }

    fn fallback_program(&mut self) -> Result<WgpuShaderProgram, ShaderError> {
        let path = Path::new("<builtin>");
        let vertex = compile_source(ShaderStage::Vertex, FALLBACK_VERTEX, path)?;
        let fragment = compile_source(ShaderStage::Fragment, FALLBACK_FRAGMENT, path)?;
        self.create_program("fallback", link(vertex, fragment)?)
    }

    fn resize(&mut self, size: Resolution) {
        self.size = size;
        if size.is_empty() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        tracing::debug!(width = size.width, height = size.height, "surface reconfigured");
    }

    fn size(&self) -> Resolution {
        self.size
    }

    fn draw_frame(
        &mut self,
        program: &mut WgpuShaderProgram,
        clear_color: [f32; 4],
    ) -> Result<FrameOutcome, RenderError> {
        if self.size.is_empty() {
            return Ok(FrameOutcome::Skipped);
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout, skipping frame");
                return Ok(FrameOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        program.flush(&self.queue);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad_encoder"),
            });

        {
            let [r, g, b, a] = clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&program.pipeline);
            if let Some(bind_group) = program.bind_group() {
                pass.set_bind_group(0, bind_group, &[]);
            }
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..QUAD_INDEX_COUNT, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(FrameOutcome::Presented)
    }
}
