//! Program drawing [`Water`] surfaces.
//!
//! The surface is a flat quad in the xz plane. Its fragment shader blends
//! the reflection and refraction captures of the water, distorted by the
//! du/dv map and lit with the normal map. The refraction depth attachment
//! gives the water depth used for soft edges.

use wgpu::util::DeviceExt;

use crate::{
    camera::CameraUniform,
    data_structures::{model::Vertex, texture},
    pipelines::{
        PipelineDesc, ShaderProgram, TextureSlot, UniformBlock, UniformPool, camera_layout,
        depth_write_state, mk_render_pipeline, uniform_layout,
    },
    renderable::water::Water,
    resources::database::{AssetDatabase, Fallback},
};

pub const CAMERA_GROUP: u32 = 0;
pub const WATER_GROUP: u32 = 1;
pub const LIGHT_GROUP: u32 = 2;
pub const TEXTURE_GROUP: u32 = 3;

const DUDV: TextureSlot = TextureSlot(0);
const REFLECTION: TextureSlot = TextureSlot(1);
const REFRACTION: TextureSlot = TextureSlot(2);
/// The depth attachment is read with `textureLoad` and has no sampler.
const REFRACTION_DEPTH: TextureSlot = TextureSlot(3);
const NORMAL: TextureSlot = TextureSlot(4);

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterVertex {
    pub position: [f32; 2],
}

impl Vertex for WaterVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<WaterVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

/// Two triangles spanning -1..1 on x and z.
pub const QUAD: &[WaterVertex] = &[
    WaterVertex { position: [-1.0, -1.0] },
    WaterVertex { position: [-1.0, 1.0] },
    WaterVertex { position: [1.0, -1.0] },
    WaterVertex { position: [1.0, -1.0] },
    WaterVertex { position: [-1.0, 1.0] },
    WaterVertex { position: [1.0, 1.0] },
];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    pub m_mat: [[f32; 4]; 4],
    pub additive_color: [f32; 4],
    /// rgb: multiplicative color, a: transparency exponent
    pub multiplicative_color: [f32; 4],
    pub tiling: f32,
    pub offset: f32,
    pub wave_strength: f32,
    pub soft_edge_depth: f32,
    pub shininess: f32,
    pub shine_damper: f32,
    pub reflection_enabled: u32,
    pub refraction_enabled: u32,
}

impl From<&Water> for WaterUniform {
    fn from(water: &Water) -> Self {
        let [r, g, b] = water.color.to_rgb();
        Self {
            m_mat: (*water.trans_mat()).into(),
            additive_color: water.additive_color.to_rgba(),
            multiplicative_color: [r, g, b, water.transparency],
            tiling: water.tiling,
            offset: water.offset,
            wave_strength: water.wave_strength,
            soft_edge_depth: water.soft_edge_depth,
            shininess: water.shininess,
            shine_damper: water.shine_damper,
            reflection_enabled: water.reflection_enabled as u32,
            refraction_enabled: water.refraction_enabled as u32,
        }
    }
}

fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let visibility = wgpu::ShaderStages::FRAGMENT;
    let mut entries = Vec::with_capacity(9);
    for slot in [DUDV, REFLECTION, REFRACTION, NORMAL] {
        entries.extend(slot.layout_entries(visibility));
    }
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: REFRACTION_DEPTH.texture_binding(),
        visibility,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Depth,
        },
        count: None,
    });
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("water_texture_bind_group_layout"),
    })
}

pub struct WaterShader {
    pipeline: wgpu::RenderPipeline,
    camera: UniformBlock<CameraUniform>,
    waters: UniformPool<WaterUniform>,
    texture_layout: wgpu::BindGroupLayout,
    textures: Vec<wgpu::BindGroup>,
    quad: wgpu::Buffer,
    repeat_sampler: wgpu::Sampler,
}

impl WaterShader {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        light_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let camera_layout = camera_layout(device);
        let water_layout = uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            "water_bind_group_layout",
        );
        let texture_layout = texture_layout(device);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Water Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &water_layout, light_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Water Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("water.wgsl").into()),
        });
        let pipeline = mk_render_pipeline(
            device,
            PipelineDesc {
                label: "Water Pipeline",
                layout: &layout,
                shader: &shader,
                fragment_entry: "fs_main",
                color_format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_stencil: Some(depth_write_state()),
                vertex_layouts: &[WaterVertex::desc()],
                cull_mode: None,
            },
        );
        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Vertex Buffer"),
            contents: bytemuck::cast_slice(QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("water repeat sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            camera: UniformBlock::new(
                device,
                &camera_layout,
                &CameraUniform::new(),
                "Water Camera Buffer",
            ),
            waters: UniformPool::new(water_layout, "Water Buffer"),
            texture_layout,
            textures: Vec::new(),
            quad,
            repeat_sampler,
        }
    }

    /// Upload the uniforms of `waters` and bind their maps and captures.
    ///
    /// Must run after the captures of this frame were (re)created, since the
    /// bind groups reference the current framebuffer attachments.
    pub fn prepare_water(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        waters: &[&Water],
        db: &AssetDatabase,
    ) {
        self.waters.ensure(device, waters.len());
        self.textures.clear();
        let clamp_sampler = texture::create_default_sampler(device);
        for (i, water) in waters.iter().enumerate() {
            if let Some(block) = self.waters.get(i) {
                block.write(queue, &WaterUniform::from(*water));
            }
            let dudv = db.texture(Some(&water.dudv_map), Fallback::Black);
            let normal = db.texture(Some(&water.normal_map), Fallback::NormalMap);
            let reflection = water.reflection_fbo().color_attachment();
            let refraction = water.refraction_fbo().color_attachment();
            let depth = water.refraction_fbo().depth_attachment();

            let mut entries = Vec::with_capacity(9);
            entries.extend(DUDV.entries(&dudv.view, &self.repeat_sampler));
            entries.extend(REFLECTION.entries(
                &reflection.view,
                reflection.sampler.as_ref().unwrap_or(&clamp_sampler),
            ));
            entries.extend(REFRACTION.entries(
                &refraction.view,
                refraction.sampler.as_ref().unwrap_or(&clamp_sampler),
            ));
            entries.push(wgpu::BindGroupEntry {
                binding: REFRACTION_DEPTH.texture_binding(),
                resource: wgpu::BindingResource::TextureView(&depth.view),
            });
            entries.extend(NORMAL.entries(&normal.view, &self.repeat_sampler));

            self.textures
                .push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.texture_layout,
                    entries: &entries,
                    label: Some(&format!("water #{i} texture bind group")),
                }));
        }
    }

    /// Draw the first `count` prepared waters.
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        light: &'a wgpu::BindGroup,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(CAMERA_GROUP, self.camera.bind_group(), &[]);
        render_pass.set_bind_group(LIGHT_GROUP, light, &[]);
        render_pass.set_vertex_buffer(0, self.quad.slice(..));
        for i in 0..count {
            let (Some(block), Some(textures)) = (self.waters.get(i), self.textures.get(i)) else {
                log::warn!("water {i} was not prepared, skipping");
                continue;
            };
            render_pass.set_bind_group(WATER_GROUP, block.bind_group(), &[]);
            render_pass.set_bind_group(TEXTURE_GROUP, textures, &[]);
            render_pass.draw(0..QUAD.len() as u32, 0..1);
        }
    }
}

impl ShaderProgram for WaterShader {
    fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    fn set_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform) {
        self.camera.write(queue, camera);
    }
}
