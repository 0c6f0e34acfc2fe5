use crate::mesh::{MeshData, Vertex};
use crate::shaders::{self, BACKGROUND_GRAY};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex};
use umbra_common::{ObjectKind, RasterMode};
use umbra_render::{
    Clear, DepthTargetId, DeviceError, RenderDevice, RenderError, RenderTarget, ShaderId,
    ShaderProgram, Viewport, uniforms,
};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: BACKGROUND_GRAY as f64,
    g: BACKGROUND_GRAY as f64,
    b: BACKGROUND_GRAY as f64,
    a: 1.0,
};

/// Uniform block uploaded once per draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShaderUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 3],
    pub light_dir_matrix: [[f32; 4]; 3],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub point_light_pos: [f32; 4],
    pub fog_density: f32,
    pub point_light_enabled: i32,
    pub shadow_unit: i32,
    pub _pad: f32,
}

impl Default for ShaderUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        let identity3 = mat3_padded(Mat3::IDENTITY);
        Self {
            model: identity,
            view: identity,
            projection: identity,
            light_space: identity,
            normal_matrix: identity3,
            light_dir_matrix: identity3,
            light_dir: [0.0, 1.0, 0.0, 0.0],
            light_color: [1.0; 4],
            point_light_pos: [0.0, 0.0, 0.0, 1.0],
            fog_density: 0.0,
            point_light_enabled: 0,
            shadow_unit: 0,
            _pad: 0.0,
        }
    }
}

/// WGSL stores each `mat3x3` column in 16 bytes.
fn mat3_padded(m: Mat3) -> [[f32; 4]; 3] {
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

/// Stride between per-draw blocks in the dynamic uniform buffer.
fn uniform_stride(min_alignment: u32) -> u64 {
    let size = std::mem::size_of::<ShaderUniforms>() as u64;
    let align = u64::from(min_alignment.max(1));
    size.div_ceil(align) * align
}

/// Uniform values for one shader, keyed by the names the passes use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuProgram {
    uniforms: ShaderUniforms,
}

impl GpuProgram {
    pub fn uniforms(&self) -> &ShaderUniforms {
        &self.uniforms
    }
}

impl ShaderProgram for GpuProgram {
    fn set_mat4(&mut self, name: &str, value: Mat4) {
        let slot = match name {
            uniforms::MODEL => &mut self.uniforms.model,
            uniforms::VIEW => &mut self.uniforms.view,
            uniforms::PROJECTION => &mut self.uniforms.projection,
            uniforms::LIGHT_SPACE => &mut self.uniforms.light_space,
            _ => return tracing::trace!(name, "unused mat4 uniform"),
        };
        *slot = value.to_cols_array_2d();
    }

    fn set_mat3(&mut self, name: &str, value: Mat3) {
        let slot = match name {
            uniforms::NORMAL_MATRIX => &mut self.uniforms.normal_matrix,
            uniforms::LIGHT_DIR_MATRIX => &mut self.uniforms.light_dir_matrix,
            _ => return tracing::trace!(name, "unused mat3 uniform"),
        };
        *slot = mat3_padded(value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        match name {
            uniforms::LIGHT_DIR => self.uniforms.light_dir = value.extend(0.0).to_array(),
            uniforms::LIGHT_COLOR => self.uniforms.light_color = value.extend(1.0).to_array(),
            uniforms::POINT_LIGHT_POSITION => {
                self.uniforms.point_light_pos = value.extend(1.0).to_array()
            }
            _ => tracing::trace!(name, "unused vec3 uniform"),
        }
    }

    fn set_float(&mut self, name: &str, value: f32) {
        match name {
            uniforms::FOG_DENSITY => self.uniforms.fog_density = value,
            _ => tracing::trace!(name, "unused float uniform"),
        }
    }

    fn set_int(&mut self, name: &str, value: i32) {
        match name {
            uniforms::POINT_LIGHT_ENABLED => self.uniforms.point_light_enabled = value,
            uniforms::SHADOW_MAP => self.uniforms.shadow_unit = value,
            _ => tracing::trace!(name, "unused int uniform"),
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DepthTarget {
    view: wgpu::TextureView,
    sampled: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DrawKind {
    Mesh(ObjectKind),
    Skybox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineKey {
    Depth,
    Lit(RasterMode),
    Marker,
    Skybox,
}

#[derive(Debug, Clone, Copy)]
struct DrawRecord {
    kind: DrawKind,
    pipeline: PipelineKey,
    block: u32,
    viewport: Viewport,
    shadow: Option<DepthTargetId>,
}

#[derive(Debug)]
struct PassRecord {
    target: RenderTarget,
    clear: Option<Clear>,
    draws: Vec<DrawRecord>,
}

struct Pipelines {
    depth: wgpu::RenderPipeline,
    lit: [Option<wgpu::RenderPipeline>; 3],
    marker: wgpu::RenderPipeline,
    skybox: wgpu::RenderPipeline,
}

fn raster_index(mode: RasterMode) -> usize {
    match mode {
        RasterMode::Fill => 0,
        RasterMode::Wireframe => 1,
        RasterMode::Points => 2,
    }
}

fn vertex_layout(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// wgpu implementation of `RenderDevice`.
///
/// Device calls are recorded into pass lists; `submit` turns them into
/// render passes on one encoder. Per-draw uniforms are packed into a single
/// buffer addressed with dynamic offsets.
pub struct WgpuRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface_format: wgpu::TextureFormat,
    pipelines: Pipelines,
    uniform_layout: wgpu::BindGroupLayout,
    shadow_layout: wgpu::BindGroupLayout,
    shadow_sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: u32,
    stride: u64,
    meshes: Vec<(ObjectKind, GpuMesh)>,
    skybox_mesh: GpuMesh,
    depth_targets: Vec<DepthTarget>,
    screen_depth: wgpu::TextureView,
    programs: [GpuProgram; 4],
    blocks: Vec<ShaderUniforms>,
    passes: Vec<PassRecord>,
    viewport: Viewport,
    raster_mode: RasterMode,
    sampled_shadow: Option<DepthTargetId>,
    errors: Arc<Mutex<Vec<DeviceError>>>,
}

impl WgpuRenderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        device.on_uncaptured_error(Box::new(move |error: wgpu::Error| {
            if let Ok(mut errors) = sink.lock() {
                errors.push(DeviceError::new(error.to_string()));
            }
        }));

        let stride = uniform_stride(device.limits().min_uniform_buffer_offset_alignment);
        let block_size = NonZeroU64::new(std::mem::size_of::<ShaderUniforms>() as u64);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: block_size,
                },
                count: None,
            }],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let pipelines = Self::create_pipelines(&device, surface_format, &uniform_layout, &shadow_layout);

        let uniform_capacity = 64;
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniform_buffer(&device, &uniform_layout, stride, uniform_capacity);

        let meshes = ObjectKind::ALL
            .iter()
            .map(|&object| {
                let mesh = GpuMesh::upload(&device, object.name(), &MeshData::placeholder(object));
                (object, mesh)
            })
            .collect();
        let skybox_mesh = GpuMesh::upload(&device, "skybox", &MeshData::skybox());
        let screen_depth = Self::create_screen_depth(&device, width, height);

        tracing::info!(?surface_format, stride, "wgpu renderer created");

        Self {
            device,
            queue,
            surface_format,
            pipelines,
            uniform_layout,
            shadow_layout,
            shadow_sampler,
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity,
            stride,
            meshes,
            skybox_mesh,
            depth_targets: Vec::new(),
            screen_depth,
            programs: Default::default(),
            blocks: Vec::new(),
            passes: Vec::new(),
            viewport: Viewport::sized(width, height),
            raster_mode: RasterMode::Fill,
            sampled_shadow: None,
            errors,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Replace the geometry drawn for `object`.
    pub fn upload_mesh(&mut self, object: ObjectKind, mesh: &MeshData) {
        let uploaded = GpuMesh::upload(&self.device, object.name(), mesh);
        match self.meshes.iter_mut().find(|(kind, _)| *kind == object) {
            Some((_, slot)) => *slot = uploaded,
            None => self.meshes.push((object, uploaded)),
        }
        tracing::debug!(object = object.name(), indices = mesh.indices.len(), "mesh uploaded");
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.screen_depth = Self::create_screen_depth(&self.device, width, height);
    }

    /// Encode and submit everything recorded since the last call, drawing
    /// screen passes into `view`.
    pub fn submit(&mut self, view: &wgpu::TextureView) {
        self.upload_blocks();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        for record in &self.passes {
            if record.draws.is_empty() && record.clear.is_none() {
                continue;
            }
            self.encode_pass(&mut encoder, record, view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.passes.clear();
        self.blocks.clear();
    }

    fn upload_blocks(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        let count = self.blocks.len() as u32;
        if count > self.uniform_capacity {
            let capacity = count.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_uniform_buffer(&self.device, &self.uniform_layout, self.stride, capacity);
            self.uniform_buffer = buffer;
            self.uniform_bind_group = bind_group;
            self.uniform_capacity = capacity;
            tracing::debug!(capacity, "uniform buffer grown");
        }

        let stride = self.stride as usize;
        let mut bytes = vec![0u8; stride * self.blocks.len()];
        for (chunk, block) in bytes.chunks_exact_mut(stride).zip(&self.blocks) {
            let src = bytemuck::bytes_of(block);
            chunk[..src.len()].copy_from_slice(src);
        }
        self.queue.write_buffer(&self.uniform_buffer, 0, &bytes);
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        record: &PassRecord,
        surface: &wgpu::TextureView,
    ) {
        let clear_depth = record.clear.is_some();
        let depth_ops = Some(wgpu::Operations {
            load: if clear_depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            },
            store: wgpu::StoreOp::Store,
        });

        let mut pass = match record.target {
            RenderTarget::Depth(id) => {
                let Some(target) = self.depth_targets.get(id.0 as usize) else {
                    tracing::warn!(id = id.0, "draws to unknown depth target dropped");
                    return;
                };
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadow_pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &target.view,
                        depth_ops,
                        stencil_ops: None,
                    }),
                    ..Default::default()
                })
            }
            RenderTarget::Screen => {
                let load = if record.clear == Some(Clear::ColorAndDepth) {
                    wgpu::LoadOp::Clear(CLEAR_COLOR)
                } else {
                    wgpu::LoadOp::Load
                };
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("forward_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: surface,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.screen_depth,
                        depth_ops,
                        stencil_ops: None,
                    }),
                    ..Default::default()
                })
            }
        };

        for draw in &record.draws {
            let mesh = match draw.kind {
                DrawKind::Skybox => &self.skybox_mesh,
                DrawKind::Mesh(object) => {
                    match self.meshes.iter().find(|(kind, _)| *kind == object) {
                        Some((_, mesh)) => mesh,
                        None => continue,
                    }
                }
            };
            let pipeline = match draw.pipeline {
                PipelineKey::Depth => &self.pipelines.depth,
                PipelineKey::Lit(mode) => match &self.pipelines.lit[raster_index(mode)] {
                    Some(pipeline) => pipeline,
                    None => continue,
                },
                PipelineKey::Marker => &self.pipelines.marker,
                PipelineKey::Skybox => &self.pipelines.skybox,
            };
            if let PipelineKey::Lit(_) = draw.pipeline {
                let Some(target) = draw.shadow.and_then(|id| self.depth_targets.get(id.0 as usize))
                else {
                    tracing::warn!("lit draw without a sampled shadow map skipped");
                    continue;
                };
                pass.set_bind_group(1, &target.sampled, &[]);
            }

            let v = draw.viewport;
            pass.set_viewport(
                v.x as f32,
                v.y as f32,
                v.width as f32,
                v.height as f32,
                0.0,
                1.0,
            );
            pass.set_pipeline(pipeline);
            let offset = (u64::from(draw.block) * self.stride) as u32;
            pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Snapshot `shader`'s uniforms into the per-draw list.
    fn push_block(&mut self, shader: ShaderId) -> u32 {
        self.blocks.push(self.programs[shader.index()].uniforms);
        (self.blocks.len() - 1) as u32
    }

    fn push_draw(&mut self, record: DrawRecord) {
        if self.passes.is_empty() {
            self.bind_target(RenderTarget::Screen);
        }
        if let Some(pass) = self.passes.last_mut() {
            pass.draws.push(record);
        }
    }

    fn lit_mode(&self) -> RasterMode {
        if self.pipelines.lit[raster_index(self.raster_mode)].is_some() {
            self.raster_mode
        } else {
            RasterMode::Fill
        }
    }

    fn create_uniform_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u32,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: stride * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ShaderUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_pipelines(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
        shadow_layout: &wgpu::BindGroupLayout,
    ) -> Pipelines {
        let plain_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("plain_pipeline_layout"),
            bind_group_layouts: &[uniform_layout],
            push_constant_ranges: &[],
        });
        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit_pipeline_layout"),
            bind_group_layouts: &[uniform_layout, shadow_layout],
            push_constant_ranges: &[],
        });

        let position_only = wgpu::vertex_attr_array![0 => Float32x3];
        let full = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];
        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let depth_state = |compare: wgpu::CompareFunction, write: bool| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: write,
            depth_compare: compare,
            stencil: Default::default(),
            bias: Default::default(),
        };

        // Depth pipeline
        let depth_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("depth_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::depth_shader().into()),
        });
        let depth = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("depth_pipeline"),
            layout: Some(&plain_layout),
            vertex: wgpu::VertexState {
                module: &depth_shader,
                entry_point: Some("vs_depth"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout(&position_only)],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
                ..depth_state(wgpu::CompareFunction::LessEqual, true)
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Lit pipelines, one per polygon mode the adapter supports
        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::lit_shader().into()),
        });
        let features = device.features();
        let modes = [
            (RasterMode::Fill, wgpu::PolygonMode::Fill, true),
            (
                RasterMode::Wireframe,
                wgpu::PolygonMode::Line,
                features.contains(wgpu::Features::POLYGON_MODE_LINE),
            ),
            (
                RasterMode::Points,
                wgpu::PolygonMode::Point,
                features.contains(wgpu::Features::POLYGON_MODE_POINT),
            ),
        ];
        let lit = modes.map(|(mode, polygon_mode, supported)| {
            if !supported {
                tracing::warn!(?mode, "polygon mode unsupported, falling back to fill");
                return None;
            }
            Some(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("lit_pipeline"),
                layout: Some(&lit_layout),
                vertex: wgpu::VertexState {
                    module: &lit_shader,
                    entry_point: Some("vs_lit"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout(&full)],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &lit_shader,
                    entry_point: Some("fs_lit"),
                    compilation_options: Default::default(),
                    targets: &color_target,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    polygon_mode,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state(wgpu::CompareFunction::Less, true)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            }))
        });

        // Light marker pipeline
        let marker_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("marker_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::marker_shader().into()),
        });
        let marker = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("marker_pipeline"),
            layout: Some(&plain_layout),
            vertex: wgpu::VertexState {
                module: &marker_shader,
                entry_point: Some("vs_marker"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout(&position_only)],
            },
            fragment: Some(wgpu::FragmentState {
                module: &marker_shader,
                entry_point: Some("fs_marker"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state(wgpu::CompareFunction::Less, true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Skybox pipeline: drawn last at the far plane without writing depth
        let skybox_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::skybox_shader().into()),
        });
        let skybox = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox_pipeline"),
            layout: Some(&plain_layout),
            vertex: wgpu::VertexState {
                module: &skybox_shader,
                entry_point: Some("vs_skybox"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout(&position_only)],
            },
            fragment: Some(wgpu::FragmentState {
                module: &skybox_shader,
                entry_point: Some("fs_skybox"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(wgpu::CompareFunction::LessEqual, false)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Pipelines {
            depth,
            lit,
            marker,
            skybox,
        }
    }

    fn create_screen_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("screen_depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl RenderDevice for WgpuRenderer {
    type Program = GpuProgram;

    fn allocate_depth_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<DepthTargetId, RenderError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::DepthTargetAllocation {
                width,
                height,
                reason: format!("adapter limit is {max}x{max}"),
            });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let sampled = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &self.shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
                },
            ],
        });
        let id = DepthTargetId(self.depth_targets.len() as u32);
        self.depth_targets.push(DepthTarget { view, sampled });
        Ok(id)
    }

    fn bind_target(&mut self, target: RenderTarget) {
        self.passes.push(PassRecord {
            target,
            clear: None,
            draws: Vec::new(),
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear(&mut self, clear: Clear) {
        let target = match self.passes.last() {
            Some(pass) => pass.target,
            None => RenderTarget::Screen,
        };
        // A clear after draws needs its own pass to keep the load op ordered.
        if self.passes.last().is_none_or(|pass| !pass.draws.is_empty()) {
            self.bind_target(target);
        }
        if let Some(pass) = self.passes.last_mut() {
            pass.clear = Some(clear);
        }
    }

    fn bind_shader(&mut self, shader: ShaderId) -> &mut GpuProgram {
        &mut self.programs[shader.index()]
    }

    fn bind_depth_texture(&mut self, target: DepthTargetId, _unit: u32) {
        self.sampled_shadow = Some(target);
    }

    fn set_raster_mode(&mut self, mode: RasterMode) {
        self.raster_mode = mode;
    }

    fn draw_mesh(&mut self, object: ObjectKind, shader: ShaderId) {
        let pipeline = match shader {
            ShaderId::Depth => PipelineKey::Depth,
            ShaderId::Lit => PipelineKey::Lit(self.lit_mode()),
            ShaderId::LightMarker => PipelineKey::Marker,
            ShaderId::Skybox => PipelineKey::Skybox,
        };
        let block = self.push_block(shader);
        let record = DrawRecord {
            kind: DrawKind::Mesh(object),
            pipeline,
            block,
            viewport: self.viewport,
            shadow: self.sampled_shadow,
        };
        self.push_draw(record);
    }

    fn draw_skybox(&mut self, view: Mat4, projection: Mat4) {
        let program = &mut self.programs[ShaderId::Skybox.index()];
        program.set_mat4(uniforms::VIEW, view);
        program.set_mat4(uniforms::PROJECTION, projection);
        let block = self.push_block(ShaderId::Skybox);
        let record = DrawRecord {
            kind: DrawKind::Skybox,
            pipeline: PipelineKey::Skybox,
            block,
            viewport: self.viewport,
            shadow: None,
        };
        self.push_draw(record);
    }

    fn drain_errors(&mut self) -> Vec<DeviceError> {
        match self.errors.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(_) => vec![DeviceError::new("error sink poisoned")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ShaderUniforms>(), 416);
        assert_eq!(std::mem::offset_of!(ShaderUniforms, normal_matrix), 256);
        assert_eq!(std::mem::offset_of!(ShaderUniforms, light_dir), 352);
        assert_eq!(std::mem::offset_of!(ShaderUniforms, fog_density), 400);
    }

    #[test]
    fn clear_matches_fog_gray() {
        let gray = f64::from(BACKGROUND_GRAY);
        assert_eq!(CLEAR_COLOR.r, gray);
        assert_eq!(CLEAR_COLOR.g, gray);
        assert_eq!(CLEAR_COLOR.b, gray);
        assert!((CLEAR_COLOR.r - 0.7).abs() < 1e-6);
    }

    #[test]
    fn stride_respects_offset_alignment() {
        assert_eq!(uniform_stride(256), 512);
        assert_eq!(uniform_stride(32), 416);
        assert_eq!(uniform_stride(0), 416);
    }

    #[test]
    fn program_maps_names_to_fields() {
        let mut program = GpuProgram::default();
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        program.set_mat4(uniforms::MODEL, model);
        program.set_float(uniforms::FOG_DENSITY, 0.25);
        program.set_int(uniforms::POINT_LIGHT_ENABLED, 1);
        program.set_vec3(uniforms::LIGHT_DIR, Vec3::X);
        program.set_mat3(uniforms::NORMAL_MATRIX, Mat3::from_diagonal(Vec3::splat(2.0)));

        let u = program.uniforms();
        assert_eq!(u.model, model.to_cols_array_2d());
        assert_eq!(u.fog_density, 0.25);
        assert_eq!(u.point_light_enabled, 1);
        assert_eq!(u.light_dir, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.normal_matrix[1], [0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn unknown_names_are_ignored() {
        let mut program = GpuProgram::default();
        program.set_mat4("texture_matrix", Mat4::ZERO);
        program.set_float("gamma", 2.2);
        assert_eq!(program, GpuProgram::default());
    }

    #[test]
    fn raster_indices_are_distinct() {
        let indices = [RasterMode::Fill, RasterMode::Wireframe, RasterMode::Points].map(raster_index);
        assert_eq!(indices, [0, 1, 2]);
    }
}
