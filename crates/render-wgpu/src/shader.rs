//! Shader programs: one pipeline plus its uniform block.
//!
//! Uniform values behave like GL program state: a value set once stays until
//! overwritten. Each draw calls [`ShaderProgram::stage`], which appends the
//! current block to a per-frame staging area and returns the dynamic offset
//! the draw binds. [`ShaderProgram::upload`] then writes the whole frame's
//! blocks with a single buffer write.

use crate::RenderError;
use crate::bindings::BindLayouts;
use crate::mesh::vertex_layout;
use crate::prefab::instance_layout;
use crate::quad::quad_layout;
use crate::shaders;
use crate::skybox::POSITION_ATTRIBUTES;
use crate::texture::DEPTH_FORMAT;
use glam::{Mat3, Mat4, Vec3};
use lumi_assets::ShaderSource;
use lumi_render::{ProgramId, UniformBlock, UniformError, UniformValue};
use std::path::Path;

/// Blocks reserved per program before the first frame grows the buffer.
const INITIAL_CAPACITY: u64 = 64;

/// Colour and sample configuration the screen pipelines render into.
#[derive(Debug, Clone, Copy)]
pub struct PipelineTargets {
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

pub struct ShaderProgram {
    id: ProgramId,
    source: ShaderSource,
    pipeline: wgpu::RenderPipeline,
    block: UniformBlock,
    /// Block size rounded up to the device's dynamic offset alignment.
    stride: u32,
    staged: Vec<u8>,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ShaderProgram {
    /// Compile `program`, preferring `<shader_dir>/<name>.wgsl` when present.
    ///
    /// An override that fails to read or validate is logged and replaced by the
    /// built-in source.
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindLayouts,
        program: ProgramId,
        shader_dir: Option<&Path>,
        targets: PipelineTargets,
    ) -> Result<Self, RenderError> {
        let builtin = shaders::builtin(program);
        let source = ShaderSource::resolve(shader_dir, program.name(), builtin).unwrap_or_else(|e| {
            tracing::warn!("{program}: {e}, using built-in shader");
            ShaderSource::builtin(program.name(), builtin)
        });

        let (source, pipeline) = match compile(device, layouts, program, &source, targets) {
            Ok(pipeline) => (source, pipeline),
            Err(message) if !source.is_builtin() => {
                tracing::warn!("{program}: override rejected, using built-in shader: {message}");
                let source = ShaderSource::builtin(program.name(), builtin);
                let pipeline = compile(device, layouts, program, &source, targets).map_err(|message| {
                    RenderError::Shader {
                        name: program.name().to_string(),
                        message,
                    }
                })?;
                (source, pipeline)
            }
            Err(message) => {
                return Err(RenderError::Shader {
                    name: program.name().to_string(),
                    message,
                });
            }
        };

        let block = UniformBlock::new(program.uniform_layout());
        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let stride = block.layout().size().div_ceil(alignment) * alignment;
        let buffer = uniform_buffer(device, program, u64::from(stride) * INITIAL_CAPACITY);
        let bind_group = layouts.uniform_group(device, program.name(), &buffer, block.layout().size());

        tracing::debug!(
            "{program}: {} byte uniform block, stride {stride}, source {}",
            block.layout().size(),
            source
                .path
                .as_deref()
                .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
        );

        Ok(Self {
            id: program,
            source,
            pipeline,
            block,
            stride,
            staged: Vec::new(),
            buffer,
            bind_group,
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    /// Set a uniform by name. Names the program does not declare are ignored.
    pub fn set(&mut self, name: &str, value: UniformValue) {
        match self.block.set(name, value) {
            Ok(()) => {}
            Err(UniformError::Unknown(_)) => tracing::trace!("{}: no uniform '{name}'", self.id),
            Err(e) => tracing::warn!("{}: {e}", self.id),
        }
    }

    pub fn set_int(&mut self, name: &str, v: i32) {
        self.set(name, v.into());
    }

    pub fn set_float(&mut self, name: &str, v: f32) {
        self.set(name, v.into());
    }

    pub fn set_vec3(&mut self, name: &str, v: Vec3) {
        self.set(name, v.into());
    }

    pub fn set_mat3(&mut self, name: &str, m: Mat3) {
        self.set(name, m.into());
    }

    pub fn set_mat4(&mut self, name: &str, m: Mat4) {
        self.set(name, m.into());
    }

    /// Drop last frame's staged blocks. Current values are kept.
    pub fn begin_frame(&mut self) {
        self.staged.clear();
    }

    /// Snapshot the current values and return the dynamic offset to bind.
    pub fn stage(&mut self) -> u32 {
        let offset = self.staged.len();
        self.staged.extend_from_slice(self.block.bytes());
        self.staged.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    /// Write every staged block, growing the buffer when the frame needs more.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layouts: &BindLayouts) {
        if self.staged.is_empty() {
            return;
        }
        let needed = self.staged.len() as u64;
        if needed > self.buffer.size() {
            let size = needed.next_power_of_two();
            tracing::debug!("{}: growing uniform buffer to {size} bytes", self.id);
            self.buffer = uniform_buffer(device, self.id, size);
            self.bind_group = layouts.uniform_group(
                device,
                self.id.name(),
                &self.buffer,
                self.block.layout().size(),
            );
        }
        queue.write_buffer(&self.buffer, 0, &self.staged);
    }

    /// Set the pipeline and the uniform group at `offset`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, offset: u32) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[offset]);
    }
}

fn uniform_buffer(device: &wgpu::Device, program: ProgramId, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{program}_uniforms")),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Build the module and pipeline inside a validation scope.
fn compile(
    device: &wgpu::Device,
    layouts: &BindLayouts,
    program: ProgramId,
    source: &ShaderSource,
    targets: PipelineTargets,
) -> Result<wgpu::RenderPipeline, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&source.name),
        source: wgpu::ShaderSource::Wgsl(source.text.as_str().into()),
    });
    let pipeline = create_pipeline(device, layouts, program, &module, targets);
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(error.to_string()),
        None => Ok(pipeline),
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layouts: &BindLayouts,
    program: ProgramId,
    module: &wgpu::ShaderModule,
    targets: PipelineTargets,
) -> wgpu::RenderPipeline {
    let bind_group_layouts = layouts.for_program(program);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{program}_pipeline_layout")),
        bind_group_layouts: &bind_group_layouts,
        push_constant_ranges: &[],
    });

    let position_only = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTRIBUTES,
    };
    let buffers = match program {
        ProgramId::Lit | ProgramId::Unlit | ProgramId::ShadowDepth | ProgramId::Pbr => {
            vec![vertex_layout()]
        }
        ProgramId::Instanced => vec![vertex_layout(), instance_layout()],
        ProgramId::Skybox => vec![position_only],
        ProgramId::DepthDebug => vec![quad_layout()],
    };

    let (depth_write_enabled, depth_compare) = match program {
        ProgramId::Skybox => (false, wgpu::CompareFunction::LessEqual),
        ProgramId::DepthDebug => (false, wgpu::CompareFunction::Always),
        _ => (true, wgpu::CompareFunction::Less),
    };
    let topology = match program {
        ProgramId::DepthDebug => wgpu::PrimitiveTopology::TriangleStrip,
        _ => wgpu::PrimitiveTopology::TriangleList,
    };

    let color_targets = [Some(wgpu::ColorTargetState {
        format: targets.color_format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];
    let depth_only = program == ProgramId::ShadowDepth;
    let fragment = (!depth_only).then(|| wgpu::FragmentState {
        module,
        entry_point: Some("fs_main"),
        compilation_options: Default::default(),
        targets: &color_targets,
    });
    let sample_count = if depth_only { 1 } else { targets.sample_count };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{program}_pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment,
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}
