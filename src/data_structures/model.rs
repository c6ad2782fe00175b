//! GPU side meshes and models.

use std::ops::Range;

use parry3d::shape::SharedShape;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::{Material, TextureType},
        texture,
    },
    pipelines::{
        TextureSlot,
        entity::{MATERIAL_GROUP, MATERIAL_UNIFORM_BINDING, material_layout},
    },
    resources::{
        database::{AssetDatabase, Fallback},
        mesh::MeshData,
    },
};

/// Types that can describe their own vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
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
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Interleave the flat attribute arrays of `data`.
pub fn interleave(data: &MeshData) -> Vec<ModelVertex> {
    let positions = data.vertices().chunks_exact(3);
    let tex_coords = data.tex_coords().chunks_exact(2);
    let normals = data.normals().chunks_exact(3);
    let tangents = data.tangents().chunks_exact(3);
    positions
        .zip(tex_coords)
        .zip(normals)
        .zip(tangents)
        .map(|(((p, t), n), tg)| ModelVertex {
            position: [p[0], p[1], p[2]],
            tex_coords: [t[0], t[1]],
            normal: [n[0], n[1], n[2]],
            tangent: [tg[0], tg[1], tg[2]],
        })
        .collect()
}

/// A mesh on the GPU together with its material binding.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: Material,
    pub material_buffer: wgpu::Buffer,
    pub material_bind_group: wgpu::BindGroup,
    pub shape: Option<SharedShape>,
}

impl Mesh {
    /// Upload `data` and bind its material maps, resolved through `db`.
    pub fn upload(device: &wgpu::Device, data: &MeshData, db: &AssetDatabase) -> Self {
        let vertices = interleave(data);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", data.name())),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", data.name())),
            contents: bytemuck::cast_slice(data.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let material = data.material().clone();
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", data.name())),
            contents: bytemuck::cast_slice(&[material.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let material_bind_group =
            material_bind_group(device, data.name(), &material, &material_buffer, db);

        Self {
            name: data.name().to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices().len() as u32,
            material,
            material_buffer,
            material_bind_group,
            shape: data.shape().cloned(),
        }
    }
}

fn material_bind_group(
    device: &wgpu::Device,
    name: &str,
    material: &Material,
    uniform: &wgpu::Buffer,
    db: &AssetDatabase,
) -> wgpu::BindGroup {
    let default_sampler = texture::create_default_sampler(device);
    let textures = TextureType::ALL.map(|ty| db.texture(material.map(ty), Fallback::for_slot(ty)));

    let mut entries: Vec<wgpu::BindGroupEntry> = textures
        .iter()
        .enumerate()
        .flat_map(|(unit, texture)| {
            let sampler = texture.sampler.as_ref().unwrap_or(&default_sampler);
            TextureSlot(unit as u32).entries(&texture.view, sampler)
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: MATERIAL_UNIFORM_BINDING,
        resource: uniform.as_entire_binding(),
    });

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &material_layout(device),
        entries: &entries,
        label: Some(&format!("{name} material bind group")),
    })
}

#[derive(Debug, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn upload(
        device: &wgpu::Device,
        name: &str,
        meshes: &[MeshData],
        db: &AssetDatabase,
    ) -> Self {
        Self {
            name: name.to_string(),
            meshes: meshes.iter().map(|m| Mesh::upload(device, m, db)).collect(),
        }
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_model(&mut self, model: &'a Model);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(MATERIAL_GROUP, &mesh.material_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model(&mut self, model: &'b Model) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh);
        }
    }
}
