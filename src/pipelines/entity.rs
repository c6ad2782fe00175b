//! Program drawing imported models with their materials.
//!
//! Bind groups: 0 camera, 1 light, 2 material (six texture units plus the
//! material scalars), 3 node (model and normal matrix).

use cgmath::Matrix4;

use crate::{
    camera::CameraUniform,
    data_structures::{
        model::{DrawModel, ModelVertex, Vertex},
        texture::Texture,
        transform::Transform,
    },
    pipelines::{
        PipelineDesc, ShaderProgram, TextureSlot, UniformBlock, UniformPool, camera_layout,
        depth_write_state, mk_render_pipeline, uniform_layout,
    },
    render::EntityDraw,
};

pub const CAMERA_GROUP: u32 = 0;
pub const LIGHT_GROUP: u32 = 1;
pub const MATERIAL_GROUP: u32 = 2;
pub const NODE_GROUP: u32 = 3;

/// Binding of [`MaterialUniform`](crate::data_structures::material::MaterialUniform)
/// after the six texture units.
pub const MATERIAL_UNIFORM_BINDING: u32 = 12;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl NodeUniform {
    pub fn new(world: &Matrix4<f32>) -> Self {
        Self {
            model: (*world).into(),
            normal: Transform::normal_matrix(world).into(),
        }
    }
}

/// Texture units 0 to 5 in [`TextureType::ALL`](crate::data_structures::material::TextureType::ALL)
/// order, followed by the material uniform.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let visibility = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..6)
        .flat_map(|unit| TextureSlot(unit).layout_entries(visibility))
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: MATERIAL_UNIFORM_BINDING,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("material_bind_group_layout"),
    })
}

pub struct EntityShader {
    main: wgpu::RenderPipeline,
    capture: wgpu::RenderPipeline,
    camera: UniformBlock<CameraUniform>,
    nodes: UniformPool<NodeUniform>,
}

impl EntityShader {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        light_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let camera_layout = camera_layout(device);
        let node_layout = uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX,
            "node_bind_group_layout",
        );
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Entity Pipeline Layout"),
            bind_group_layouts: &[
                &camera_layout,
                light_layout,
                &material_layout(device),
                &node_layout,
            ],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Entity Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("entity.wgsl").into()),
        });
        let pipeline = |label, color_format| {
            mk_render_pipeline(
                device,
                PipelineDesc {
                    label,
                    layout: &layout,
                    shader: &shader,
                    fragment_entry: "fs_main",
                    color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    depth_stencil: Some(depth_write_state()),
                    vertex_layouts: &[ModelVertex::desc()],
                    cull_mode: Some(wgpu::Face::Back),
                },
            )
        };

        Self {
            main: pipeline("Entity Pipeline", surface_format),
            capture: pipeline("Entity Capture Pipeline", Texture::TARGET_FORMAT),
            camera: UniformBlock::new(
                device,
                &camera_layout,
                &CameraUniform::new(),
                "Entity Camera Buffer",
            ),
            nodes: UniformPool::new(node_layout, "Entity Node Buffer"),
        }
    }

    /// Pipeline for the off-screen water captures.
    pub fn capture_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.capture
    }

    /// Upload the world matrices of this frame's draws.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, draws: &[EntityDraw]) {
        self.nodes.ensure(device, draws.len());
        for (i, draw) in draws.iter().enumerate() {
            if let Some(block) = self.nodes.get(i) {
                block.write(queue, &NodeUniform::new(&draw.world));
            }
        }
    }

    /// Record `draws` with `pipeline`, which is either [`ShaderProgram::pipeline`]
    /// or [`Self::capture_pipeline`]. Expects [`Self::prepare`] to have run.
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a wgpu::RenderPipeline,
        light: &'a wgpu::BindGroup,
        draws: &[EntityDraw<'a>],
    ) {
        if draws.is_empty() {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(CAMERA_GROUP, self.camera.bind_group(), &[]);
        render_pass.set_bind_group(LIGHT_GROUP, light, &[]);
        for (i, draw) in draws.iter().enumerate() {
            let Some(node) = self.nodes.get(i) else {
                log::warn!("entity draw {i} has no prepared uniform, skipping");
                continue;
            };
            render_pass.set_bind_group(NODE_GROUP, node.bind_group(), &[]);
            render_pass.draw_model(draw.model);
        }
    }
}

impl ShaderProgram for EntityShader {
    fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.main
    }

    fn set_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform) {
        self.camera.write(queue, camera);
    }
}
