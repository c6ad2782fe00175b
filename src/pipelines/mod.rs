//! Shader programs and their uniform plumbing.
//!
//! Each program owns its render pipelines, the bind group layouts they use
//! and the uniform buffers that feed them. Renderables stay CPU objects; a
//! program turns their state into uniform data right before drawing.
//!
//! Texture bindings follow one convention in every program: texture unit
//! `n` binds its texture at `2n` and its sampler at `2n + 1` (see
//! [`TextureSlot`]).

use std::marker::PhantomData;

use wgpu::util::DeviceExt;

use crate::camera::CameraUniform;

pub mod entity;
pub mod gui;
pub mod light;
pub mod water;

/// Common surface of the engine's programs.
pub trait ShaderProgram {
    /// Pipeline used for the on-screen pass.
    fn pipeline(&self) -> &wgpu::RenderPipeline;

    /// Upload the camera state the next pass will see.
    fn set_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform);
}

/// A texture unit of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSlot(pub u32);

impl TextureSlot {
    pub const fn texture_binding(self) -> u32 {
        self.0 * 2
    }

    pub const fn sampler_binding(self) -> u32 {
        self.0 * 2 + 1
    }

    /// Layout entries of a filterable 2D texture and its sampler.
    pub fn layout_entries(self, visibility: wgpu::ShaderStages) -> [wgpu::BindGroupLayoutEntry; 2] {
        [
            wgpu::BindGroupLayoutEntry {
                binding: self.texture_binding(),
                visibility,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: self.sampler_binding(),
                visibility,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ]
    }

    pub fn entries<'a>(
        self,
        view: &'a wgpu::TextureView,
        sampler: &'a wgpu::Sampler,
    ) -> [wgpu::BindGroupEntry<'a>; 2] {
        [
            wgpu::BindGroupEntry {
                binding: self.texture_binding(),
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: self.sampler_binding(),
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ]
    }
}

/// Layout of a bind group holding a single uniform buffer at binding 0.
pub fn uniform_layout(
    device: &wgpu::Device,
    visibility: wgpu::ShaderStages,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

/// Layout of the camera group, shared by every program.
pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    uniform_layout(
        device,
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        "camera_bind_group_layout",
    )
}

/// A uniform buffer of `T` with its bind group.
#[derive(Debug)]
pub struct UniformBlock<T> {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformBlock<T> {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, value: &T, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(std::slice::from_ref(value)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self {
            buffer,
            bind_group,
            _marker: PhantomData,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(std::slice::from_ref(value)));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Growable set of [`UniformBlock`]s, one per draw of a frame.
///
/// Queue writes are applied at submit time, so draws of the same submission
/// need distinct buffers.
#[derive(Debug)]
pub struct UniformPool<T> {
    layout: wgpu::BindGroupLayout,
    blocks: Vec<UniformBlock<T>>,
    label: String,
}

impl<T: bytemuck::Pod + bytemuck::Zeroable> UniformPool<T> {
    pub fn new(layout: wgpu::BindGroupLayout, label: &str) -> Self {
        Self {
            layout,
            blocks: Vec::new(),
            label: label.to_string(),
        }
    }

    /// Make sure at least `n` blocks exist.
    pub fn ensure(&mut self, device: &wgpu::Device, n: usize) {
        while self.blocks.len() < n {
            let label = format!("{} #{}", self.label, self.blocks.len());
            self.blocks
                .push(UniformBlock::new(device, &self.layout, &T::zeroed(), &label));
        }
    }

    pub fn get(&self, i: usize) -> Option<&UniformBlock<T>> {
        self.blocks.get(i)
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Depth state of opaque geometry.
pub fn depth_write_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: crate::data_structures::texture::Texture::DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Depth state of overlays: always drawn, never occluding.
pub fn depth_overlay_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        ..depth_write_state()
    }
}

pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub layout: &'a wgpu::PipelineLayout,
    pub shader: &'a wgpu::ShaderModule,
    pub fragment_entry: &'a str,
    pub color_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub cull_mode: Option<wgpu::Face>,
}

pub fn mk_render_pipeline(device: &wgpu::Device, desc: PipelineDesc) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            buffers: desc.vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some(desc.fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.color_format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: desc.depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
