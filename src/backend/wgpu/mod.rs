//! wgpu backend.
//!
//! wgpu has no bound-program state, so this backend emulates it: uniform
//! writes update a CPU copy of the bound program's [`DrawUniforms`], and every
//! draw records a command with a snapshot of that copy. [`WgpuFrames::render`]
//! then replays the recorded commands in a single render pass, with one slot
//! of a dynamic-offset uniform buffer per draw.

mod pipelines;

use std::{cell::RefCell, collections::HashMap, iter, rc::Rc};

use wgpu::util::DeviceExt;

pub use pipelines::DEPTH_FORMAT;
use pipelines::GpuVertex;

use crate::{
    config::UniformNames,
    data_structures::mesh::VertexData,
    error::{Error, Result, ShaderStage},
    math::{self, Mat4},
    pipeline::Uniform,
};

use super::{
    Backend, GeometryId, PrimitiveKind, ProgramId, ProgramSource, TextureDesc, TextureId,
    UniformLocation, UniformValue,
};

/// Source of the stock program, one WGSL module with `vs_main` and `fs_main`.
pub const DEFAULT_SHADER: &str = include_str!("shader.wgsl");

pub fn default_program() -> ProgramSource {
    ProgramSource {
        label: "default".into(),
        vertex: DEFAULT_SHADER.into(),
        fragment: DEFAULT_SHADER.into(),
    }
}

/// Maps OpenGL clip-space depth (`[-1, 1]`) to wgpu's (`[0, 1]`).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    color: [f32; 4],
    material: [f32; 4],
    flags: [u32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            model: IDENTITY,
            view: IDENTITY,
            projection: IDENTITY,
            color: [1.0; 4],
            material: [0.2, 0.8, 0.0, 1.0],
            flags: [0, 0, 1, 0],
        }
    }
}

impl DrawUniforms {
    fn apply(&mut self, uniform: Uniform, value: UniformValue) {
        match (uniform, value) {
            (Uniform::ModelMatrix, UniformValue::Mat4(m)) => self.model = m,
            (Uniform::ViewMatrix, UniformValue::Mat4(m)) => self.view = m,
            (Uniform::ProjectionMatrix, UniformValue::Mat4(m)) => {
                let projection = OPENGL_TO_WGPU_MATRIX * Mat4::from(m);
                self.projection = math::to_columns(&projection);
            }
            (Uniform::Color, UniformValue::Vec3([r, g, b])) => self.color = [r, g, b, 1.0],
            (Uniform::Material, UniformValue::Vec4(m)) => self.material = m,
            (Uniform::TextureEnabled, UniformValue::Int(v)) => self.flags[0] = (v != 0) as u32,
            (Uniform::LightingEnabled, UniformValue::Int(v)) => self.flags[1] = (v != 0) as u32,
            (Uniform::SampleCount, UniformValue::Int(v)) => self.flags[2] = v.max(1) as u32,
            (uniform, value) => log::warn!("{uniform:?} cannot hold {value:?}; ignored"),
        }
    }
}

struct GpuProgram {
    label: String,
    pipelines: HashMap<PrimitiveKind, wgpu::RenderPipeline>,
    uniforms: DrawUniforms,
}

struct GpuGeometry {
    vertices: wgpu::Buffer,
    vertex_count: u32,
    indices: Option<(wgpu::Buffer, u32)>,
}

struct DrawCommand {
    program: ProgramId,
    geometry: GeometryId,
    kind: PrimitiveKind,
    texture: Option<TextureId>,
    uniforms: DrawUniforms,
}

struct WgpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    names: UniformNames,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    programs: Vec<GpuProgram>,
    geometries: Vec<GpuGeometry>,
    textures: Vec<wgpu::BindGroup>,
    /// Bound while no texture is, so group 1 is always valid.
    blank_texture: wgpu::BindGroup,
    active: Option<ProgramId>,
    bound_texture: Option<TextureId>,
    commands: Vec<DrawCommand>,
    /// Per-draw slot size, rounded up to the device's offset alignment.
    stride: u64,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: usize,
}

/// The [`Backend`] half; goes into the pipeline.
pub struct WgpuBackend {
    state: Rc<RefCell<WgpuState>>,
}

/// The frame half; stays with the application shell.
#[derive(Clone)]
pub struct WgpuFrames {
    state: Rc<RefCell<WgpuState>>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        names: UniformNames,
    ) -> (Self, WgpuFrames) {
        let size = std::mem::size_of::<DrawUniforms>() as u64;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = size.div_ceil(alignment) * alignment;

        let uniform_layout = pipelines::uniform_layout(&device, size);
        let texture_layout = pipelines::texture_layout(&device);
        let pipeline_layout =
            pipelines::mk_pipeline_layout(&device, &uniform_layout, &texture_layout);

        let uniform_capacity = 64;
        let (uniform_buffer, uniform_bind_group) =
            uniform_slots(&device, &uniform_layout, stride, uniform_capacity);
        let blank_texture = upload_texture(
            &device,
            &queue,
            &texture_layout,
            &TextureDesc {
                label: "blank",
                width: 1,
                height: 1,
                rgba: &[255, 255, 255, 255],
                generate_mipmaps: false,
            },
        );

        let state = Rc::new(RefCell::new(WgpuState {
            device,
            queue,
            color_format,
            names,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            programs: Vec::new(),
            geometries: Vec::new(),
            textures: Vec::new(),
            blank_texture,
            active: None,
            bound_texture: None,
            commands: Vec::new(),
            stride,
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity,
        }));
        (
            Self {
                state: state.clone(),
            },
            WgpuFrames { state },
        )
    }
}

fn uniform_slots(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw Uniform Buffer"),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
        label: Some("draw_uniforms_bind_group"),
    });
    (buffer, bind_group)
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    desc: &TextureDesc<'_>,
) -> wgpu::BindGroup {
    let mip_level_count = if desc.generate_mipmaps {
        32 - desc.width.max(desc.height).leading_zeros()
    } else {
        1
    };
    let size = wgpu::Extent3d {
        width: desc.width,
        height: desc.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(desc.label),
        size,
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let write_level = |level: u32, width: u32, height: u32, pixels: &[u8]| {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    };
    write_level(0, desc.width, desc.height, desc.rgba);
    if mip_level_count > 1 {
        if let Some(base) = image::RgbaImage::from_raw(desc.width, desc.height, desc.rgba.to_vec())
        {
            for level in 1..mip_level_count {
                let width = (desc.width >> level).max(1);
                let height = (desc.height >> level).max(1);
                let scaled = image::imageops::resize(
                    &base,
                    width,
                    height,
                    image::imageops::FilterType::Triangle,
                );
                write_level(level, width, height, scaled.as_raw());
            }
        }
    }

    let address_mode = if desc.generate_mipmaps {
        wgpu::AddressMode::Repeat
    } else {
        wgpu::AddressMode::ClampToEdge
    };
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some(desc.label),
    })
}

fn interleave(data: &VertexData) -> Vec<GpuVertex> {
    (0..data.vertex_count())
        .map(|i| GpuVertex {
            position: data.position(i),
            tex_coords: data
                .tex_coords
                .as_ref()
                .map_or([0.0; 2], |t| [t[2 * i], t[2 * i + 1]]),
            normal: data
                .normals
                .as_ref()
                .map_or([0.0; 3], |n| [n[3 * i], n[3 * i + 1], n[3 * i + 2]]),
            color: data
                .colors
                .as_ref()
                .map_or([1.0, 1.0, 1.0, 0.0], |c| [c[3 * i], c[3 * i + 1], c[3 * i + 2], 1.0]),
        })
        .collect()
}

/// Runs `f` inside a validation error scope and reports a validation error
/// as a build failure of `stage`.
#[cfg(not(target_arch = "wasm32"))]
fn validated<T>(device: &wgpu::Device, stage: ShaderStage, f: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match futures::executor::block_on(device.pop_error_scope()) {
        Some(error) => Err(Error::ShaderBuild {
            stage,
            log: error.to_string(),
        }),
        None => Ok(value),
    }
}

/// Browsers report shader errors asynchronously, on the console.
#[cfg(target_arch = "wasm32")]
fn validated<T>(_device: &wgpu::Device, _stage: ShaderStage, f: impl FnOnce() -> T) -> Result<T> {
    Ok(f())
}

impl WgpuState {
    fn shader_module(&self, label: &str, source: &str, stage: ShaderStage) -> Result<wgpu::ShaderModule> {
        validated(&self.device, stage, || {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
    }

    fn active_program(&mut self) -> Option<&mut GpuProgram> {
        let id = self.active?;
        self.programs.get_mut(id.0 as usize)
    }

    fn ensure_capacity(&mut self, draws: usize) {
        if draws <= self.uniform_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buffer, bind_group) =
            uniform_slots(&self.device, &self.uniform_layout, self.stride, capacity);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
        log::debug!("draw uniform buffer grown to {capacity} slots");
    }
}

impl Backend for WgpuBackend {
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        let mut state = self.state.borrow_mut();
        let vertex = state.shader_module(&source.label, &source.vertex, ShaderStage::Vertex)?;
        let fragment = if source.fragment == source.vertex {
            vertex.clone()
        } else {
            state.shader_module(&source.label, &source.fragment, ShaderStage::Fragment)?
        };

        let pipelines = validated(&state.device, ShaderStage::Link, || {
            PrimitiveKind::ALL
                .into_iter()
                .map(|kind| {
                    let pipeline = pipelines::mk_render_pipeline(
                        &state.device,
                        &state.pipeline_layout,
                        state.color_format,
                        kind,
                        &vertex,
                        &fragment,
                    );
                    (kind, pipeline)
                })
                .collect::<HashMap<_, _>>()
        })?;

        let id = ProgramId(state.programs.len() as u32);
        state.programs.push(GpuProgram {
            label: source.label.clone(),
            pipelines,
            uniforms: DrawUniforms::default(),
        });
        Ok(id)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        state.active = program;
        if let Some(program) = state.active_program() {
            log::trace!("program '{}' bound", program.label);
        }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        state.programs.get(program.0 as usize)?;
        Uniform::ALL
            .iter()
            .position(|u| state.names.name(*u) == name)
            .map(|slot| UniformLocation(slot as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some(uniform) = Uniform::ALL.get(location.0 as usize).copied() else {
            return;
        };
        match state.active_program() {
            Some(program) => program.uniforms.apply(uniform, value),
            None => log::warn!("uniform write without a bound program ignored"),
        }
    }

    fn create_geometry(&mut self, label: &str, data: &VertexData) -> Result<GeometryId> {
        let mut state = self.state.borrow_mut();
        let vertices = interleave(data);
        let vertex_buffer = state
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = data.indices.as_ref().map(|indices| {
            let buffer = state
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            (buffer, indices.len() as u32)
        });
        let id = GeometryId(state.geometries.len() as u32);
        state.geometries.push(GpuGeometry {
            vertices: vertex_buffer,
            vertex_count: vertices.len() as u32,
            indices,
        });
        log::debug!("geometry '{label}' uploaded as {id:?}");
        Ok(id)
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let expected = desc.width as usize * desc.height as usize * 4;
        if desc.rgba.len() != expected || expected == 0 {
            return Err(Error::resource(
                desc.label,
                format!("{} bytes for a {}x{} image", desc.rgba.len(), desc.width, desc.height),
            ));
        }
        let mut state = self.state.borrow_mut();
        let bind_group = upload_texture(&state.device, &state.queue, &state.texture_layout, desc);
        let id = TextureId(state.textures.len() as u32);
        state.textures.push(bind_group);
        Ok(id)
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.state.borrow_mut().bound_texture = texture;
    }

    fn draw(&mut self, geometry: GeometryId, kind: PrimitiveKind) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.geometries.get(geometry.0 as usize).is_none() {
            return Err(Error::resource(format!("{geometry:?}"), "unknown geometry"));
        }
        let program = state.active.ok_or(Error::NoActiveProgram)?;
        let uniforms = state
            .active_program()
            .map(|p| p.uniforms)
            .ok_or(Error::NoActiveProgram)?;
        let texture = state.bound_texture;
        state.commands.push(DrawCommand {
            program,
            geometry,
            kind,
            texture,
            uniforms,
        });
        Ok(())
    }
}

impl WgpuFrames {
    /// Drops the recorded draws without rendering them.
    pub fn discard(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Clears `target`, sets the viewport to `size`, and replays every draw
    /// recorded since the last render.
    pub fn render(
        &self,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        clear_colour: wgpu::Color,
        size: (u32, u32),
    ) {
        let mut guard = self.state.borrow_mut();
        let commands = std::mem::take(&mut guard.commands);
        guard.ensure_capacity(commands.len());
        let state = &*guard;

        for (slot, command) in commands.iter().enumerate() {
            state.queue.write_buffer(
                &state.uniform_buffer,
                slot as u64 * state.stride,
                bytemuck::bytes_of(&command.uniforms),
            );
        }

        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_viewport(0.0, 0.0, size.0.max(1) as f32, size.1.max(1) as f32, 0.0, 1.0);

            for (slot, command) in commands.iter().enumerate() {
                let (Some(program), Some(geometry)) = (
                    state.programs.get(command.program.0 as usize),
                    state.geometries.get(command.geometry.0 as usize),
                ) else {
                    continue;
                };
                let Some(pipeline) = program.pipelines.get(&command.kind) else {
                    continue;
                };
                let texture = command
                    .texture
                    .and_then(|t| state.textures.get(t.0 as usize))
                    .unwrap_or(&state.blank_texture);

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(
                    0,
                    &state.uniform_bind_group,
                    &[(slot as u64 * state.stride) as u32],
                );
                render_pass.set_bind_group(1, texture, &[]);
                render_pass.set_vertex_buffer(0, geometry.vertices.slice(..));
                match &geometry.indices {
                    Some((indices, count)) => {
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..*count, 0, 0..1);
                    }
                    None => render_pass.draw(0..geometry.vertex_count, 0..1),
                }
            }
        }
        state.queue.submit(iter::once(encoder.finish()));
        log::trace!("frame rendered with {} draws", commands.len());
    }
}
