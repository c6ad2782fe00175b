//! Program drawing [`GuiPane`]s, plus the id pass used for picking.
//!
//! Panes are unit quads transformed by their render matrix. Screen space
//! panes are drawn in normalized device coordinates; camera facing panes go
//! through the camera's view projection.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::{model::Vertex, texture},
    pipelines::{
        PipelineDesc, ShaderProgram, TextureSlot, UniformBlock, UniformPool, camera_layout,
        depth_overlay_state, mk_render_pipeline, uniform_layout,
    },
    renderable::gui::GuiPane,
    resources::database::{AssetDatabase, TEXTURE_BLACK},
};

pub const CAMERA_GROUP: u32 = 0;
pub const PANE_GROUP: u32 = 1;
pub const TEXTURE_GROUP: u32 = 2;

/// Format of the id target written by the picking pass.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GuiVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for GuiVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<GuiVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

pub const QUAD: &[GuiVertex] = &[
    GuiVertex { position: [-1.0, 1.0, 0.0], tex_coords: [0.0, 0.0] },
    GuiVertex { position: [-1.0, -1.0, 0.0], tex_coords: [0.0, 1.0] },
    GuiVertex { position: [1.0, 1.0, 0.0], tex_coords: [1.0, 0.0] },
    GuiVertex { position: [1.0, 1.0, 0.0], tex_coords: [1.0, 0.0] },
    GuiVertex { position: [-1.0, -1.0, 0.0], tex_coords: [0.0, 1.0] },
    GuiVertex { position: [1.0, -1.0, 0.0], tex_coords: [1.0, 1.0] },
];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GuiUniform {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub pick_id: u32,
    /// Non zero when the pane goes through the camera (billboards).
    pub world_space: u32,
    _padding: [u32; 2],
}

impl GuiUniform {
    pub fn new(pane: &GuiPane, camera: &Camera) -> Self {
        Self {
            transform: bytemuck::cast(pane.render_matrix(camera)),
            color: pane.color.to_rgba(),
            pick_id: pane.pick_id(),
            world_space: pane.is_facing_camera() as u32,
            _padding: [0; 2],
        }
    }
}

pub struct GuiShader {
    pipeline: wgpu::RenderPipeline,
    pick_pipeline: wgpu::RenderPipeline,
    camera: UniformBlock<CameraUniform>,
    panes: UniformPool<GuiUniform>,
    texture_layout: wgpu::BindGroupLayout,
    /// Bind groups of loaded textures, by key.
    textures: HashMap<String, wgpu::BindGroup>,
    /// Database the cached bind groups were created from.
    textures_of: Option<u64>,
    /// Resolved texture key of each prepared pane.
    bound: Vec<String>,
    quad: wgpu::Buffer,
}

impl GuiShader {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let camera_layout = camera_layout(device);
        let pane_layout = uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            "gui_pane_bind_group_layout",
        );
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &TextureSlot(0).layout_entries(wgpu::ShaderStages::FRAGMENT),
            label: Some("gui_texture_bind_group_layout"),
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gui Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("gui.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gui Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &pane_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipeline = mk_render_pipeline(
            device,
            PipelineDesc {
                label: "Gui Pipeline",
                layout: &layout,
                shader: &shader,
                fragment_entry: "fs_main",
                color_format: surface_format,
                blend: Some(wgpu::BlendState {
                    color: wgpu::BlendComponent::OVER,
                    alpha: wgpu::BlendComponent::OVER,
                }),
                depth_stencil: Some(depth_overlay_state()),
                vertex_layouts: &[GuiVertex::desc()],
                cull_mode: None,
            },
        );

        let pick_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gui Pick Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &pane_layout],
            push_constant_ranges: &[],
        });
        let pick_pipeline = mk_render_pipeline(
            device,
            PipelineDesc {
                label: "Gui Pick Pipeline",
                layout: &pick_layout,
                shader: &shader,
                fragment_entry: "fs_pick",
                color_format: PICK_FORMAT,
                blend: None,
                depth_stencil: None,
                vertex_layouts: &[GuiVertex::desc()],
                cull_mode: None,
            },
        );

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gui Vertex Buffer"),
            contents: bytemuck::cast_slice(QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            pipeline,
            pick_pipeline,
            camera: UniformBlock::new(
                device,
                &camera_layout,
                &CameraUniform::new(),
                "Gui Camera Buffer",
            ),
            panes: UniformPool::new(pane_layout, "Gui Pane Buffer"),
            texture_layout,
            textures: HashMap::new(),
            textures_of: None,
            bound: Vec::new(),
            quad,
        }
    }

    /// Upload the uniforms of `panes` and bind their textures.
    ///
    /// Unknown texture keys are drawn with the black texture and retried on
    /// the next frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        panes: &[&GuiPane],
        db: &AssetDatabase,
    ) {
        self.panes.ensure(device, panes.len());
        self.bound.clear();
        if self.textures_of != Some(db.id()) {
            self.textures.clear();
            self.textures_of = Some(db.id());
        }
        for (i, pane) in panes.iter().enumerate() {
            if let Some(block) = self.panes.get(i) {
                block.write(queue, &GuiUniform::new(pane, camera));
            }
            let key = if db.contains(&pane.texture) {
                pane.texture.as_str()
            } else {
                log::warn!("gui texture {} is not loaded, using black", pane.texture);
                TEXTURE_BLACK
            };
            if !self.textures.contains_key(key) {
                if let Some(texture) = db.get(key) {
                    let bind_group = self.texture_bind_group(device, key, texture);
                    self.textures.insert(key.to_string(), bind_group);
                }
            }
            self.bound.push(key.to_string());
        }
    }

    /// Number of texture bind groups currently cached.
    pub fn cached_textures(&self) -> usize {
        self.textures.len()
    }

    fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        key: &str,
        texture: &texture::Texture,
    ) -> wgpu::BindGroup {
        let default_sampler = texture::create_default_sampler(device);
        let sampler = texture.sampler.as_ref().unwrap_or(&default_sampler);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_layout,
            entries: &TextureSlot(0).entries(&texture.view, sampler),
            label: Some(&format!("gui texture {key}")),
        })
    }

    /// Draw the first `count` prepared panes.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, count: usize) {
        if count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(CAMERA_GROUP, self.camera.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, self.quad.slice(..));
        for i in 0..count {
            let texture = self.bound.get(i).and_then(|key| self.textures.get(key));
            let (Some(block), Some(texture)) = (self.panes.get(i), texture) else {
                log::warn!("gui pane {i} was not prepared, skipping");
                continue;
            };
            render_pass.set_bind_group(PANE_GROUP, block.bind_group(), &[]);
            render_pass.set_bind_group(TEXTURE_GROUP, texture, &[]);
            render_pass.draw(0..QUAD.len() as u32, 0..1);
        }
    }

    /// Write the pick ids of the first `count` prepared panes.
    pub fn draw_pick<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, count: usize) {
        render_pass.set_pipeline(&self.pick_pipeline);
        render_pass.set_bind_group(CAMERA_GROUP, self.camera.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, self.quad.slice(..));
        for i in 0..count {
            if let Some(block) = self.panes.get(i) {
                render_pass.set_bind_group(PANE_GROUP, block.bind_group(), &[]);
                render_pass.draw(0..QUAD.len() as u32, 0..1);
            }
        }
    }
}

impl ShaderProgram for GuiShader {
    fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    fn set_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform) {
        self.camera.write(queue, camera);
    }
}
