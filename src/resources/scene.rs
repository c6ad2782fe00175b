//! Adapters from external scene formats into one intermediate scene.
//!
//! glTF documents (via `gltf`) and Wavefront OBJ/MTL files (via `tobj`) are
//! converted into a [`RawScene`]. The importer only ever looks at
//! `RawScene`, so supporting a new format means writing one more adapter.

use std::{collections::HashMap, future::Future};

use crate::{
    data_structures::material::TextureType,
    error::{EngineError, Result},
};

/// Scene as read from a file, before any engine-side processing.
#[derive(Clone, Debug, Default)]
pub struct RawScene {
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
}

/// A single triangle mesh with per-vertex attributes.
#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// First UV channel, origin at the top left.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    /// Faces as vertex index lists. The importer accepts triangles only.
    pub faces: Vec<Vec<u32>>,
    /// Index into [`RawScene::materials`]; may be out of range.
    pub material_index: Option<usize>,
}

/// Material properties as found in the source file. Absent values stay `None`.
#[derive(Clone, Debug, Default)]
pub struct RawMaterial {
    pub name: String,
    pub textures: HashMap<TextureType, RawTexture>,
    pub diffuse_color: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub bump_scaling: Option<f32>,
}

/// A texture referenced by a material.
#[derive(Clone, Debug, PartialEq)]
pub enum RawTexture {
    /// Path relative to the model's texture directory.
    File(String),
    /// Image stored inside the model file. `key` identifies it in the asset database.
    Embedded {
        key: String,
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl RawScene {
    /// Read a glTF document from `.gltf` or `.glb` bytes.
    ///
    /// `name` prefixes the keys of embedded images. `external` resolves
    /// buffers that are referenced by URI.
    pub fn from_gltf_slice(
        bytes: &[u8],
        name: &str,
        external: impl Fn(&str) -> Result<Vec<u8>>,
    ) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice(bytes)?;

        let mut buffers: Vec<Vec<u8>> = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .as_deref()
                    .map(|blob| blob.to_vec())
                    .ok_or_else(|| EngineError::msg(format!("{name}: binary chunk is missing")))?,
                gltf::buffer::Source::Uri(uri) => external(uri).map_err(|e| {
                    EngineError::with_cause(format!("{name}: could not load buffer {uri}"), e)
                })?,
            };
            if data.len() < buffer.length() {
                return Err(EngineError::msg(format!(
                    "{name}: buffer {} holds {} bytes but declares {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                )));
            }
            buffers.push(data);
        }

        let materials = gltf
            .materials()
            .map(|material| gltf_material(name, &material, &buffers))
            .collect::<Result<Vec<_>>>()?;

        let mut meshes = Vec::new();
        for mesh in gltf.meshes() {
            let mesh_name = mesh.name().unwrap_or("unknown_mesh");
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!(
                        "{name}: skipping primitive {} of mesh {mesh_name}, only triangles are supported",
                        primitive.index()
                    );
                    continue;
                }
                meshes.push(gltf_primitive(mesh_name, &primitive, &buffers)?);
            }
        }

        Ok(Self { meshes, materials })
    }

    /// Read an OBJ file. Material libraries are requested through `mtl_loader`,
    /// which receives the library name as written in the OBJ file.
    pub async fn from_obj<F, Fut>(obj_text: &str, mtl_loader: F) -> Result<Self>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let mtl_loader = &mtl_loader;
        let (models, obj_materials) = tobj::futures::load_obj_buf(
            obj_text.as_bytes(),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |p| async move {
                let name = p.to_string_lossy().into_owned();
                match mtl_loader(name.clone()).await {
                    Some(text) => tobj::futures::load_mtl_buf(text.as_bytes()).await,
                    None => {
                        log::warn!("material library {name} could not be loaded");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            },
        )
        .await?;

        // A broken material library leaves meshes with the default material.
        let obj_materials = obj_materials.unwrap_or_else(|e| {
            log::warn!("ignoring materials of OBJ file: {e}");
            Vec::new()
        });

        let materials = obj_materials.into_iter().map(obj_material).collect();
        let meshes = models.into_iter().map(obj_mesh).collect();
        Ok(Self { meshes, materials })
    }
}

fn gltf_primitive(
    mesh_name: &str,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
) -> Result<RawMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| b.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| EngineError::MissingAttribute {
            mesh: mesh_name.to_string(),
            attribute: "positions",
        })?
        .collect();
    let normals = reader.read_normals().map(|n| n.collect::<Vec<_>>());
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|uv| uv.into_f32().collect::<Vec<_>>());
    // glTF tangents carry the bitangent sign in w, the engine only keeps xyz
    let tangents = reader
        .read_tangents()
        .map(|t| t.map(|[x, y, z, _]| [x, y, z]).collect::<Vec<_>>());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        return Err(EngineError::msg(format!(
            "mesh {mesh_name}: {} indices do not form triangles",
            indices.len()
        )));
    }
    let faces = indices.chunks_exact(3).map(|c| c.to_vec()).collect();

    Ok(RawMesh {
        name: mesh_name.to_string(),
        positions,
        tex_coords,
        normals,
        tangents,
        faces,
        material_index: primitive.material().index(),
    })
}

fn gltf_material(
    scene_name: &str,
    material: &gltf::Material,
    buffers: &[Vec<u8>],
) -> Result<RawMaterial> {
    let pbr = material.pbr_metallic_roughness();
    let mut textures = HashMap::new();

    if let Some(info) = pbr.base_color_texture() {
        let image = info.texture().source();
        textures.insert(TextureType::Diffuse, gltf_image(scene_name, &image, buffers)?);
    }
    let mut bump_scaling = None;
    if let Some(normal) = material.normal_texture() {
        let image = normal.texture().source();
        textures.insert(TextureType::Normals, gltf_image(scene_name, &image, buffers)?);
        bump_scaling = Some(normal.scale());
    }
    if let Some(occlusion) = material.occlusion_texture() {
        let image = occlusion.texture().source();
        textures.insert(TextureType::Ambient, gltf_image(scene_name, &image, buffers)?);
    }

    let [r, g, b, _] = pbr.base_color_factor();
    // Rough surfaces get a wide, weak highlight.
    let shininess = (1.0 - pbr.roughness_factor()).clamp(0.0, 1.0) * 128.0;

    Ok(RawMaterial {
        name: material.name().unwrap_or("unnamed_material").to_string(),
        textures,
        diffuse_color: Some([r, g, b]),
        shininess: Some(shininess),
        bump_scaling,
    })
}

fn gltf_image(
    scene_name: &str,
    image: &gltf::Image,
    buffers: &[Vec<u8>],
) -> Result<RawTexture> {
    match image.source() {
        gltf::image::Source::View { view, mime_type } => {
            let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
                EngineError::msg(format!(
                    "{scene_name}: image {} points to a missing buffer",
                    image.index()
                ))
            })?;
            let start = view.offset();
            let end = start + view.length();
            let bytes = buffer.get(start..end).ok_or_else(|| {
                EngineError::msg(format!(
                    "{scene_name}: image {} exceeds its buffer",
                    image.index()
                ))
            })?;
            Ok(RawTexture::Embedded {
                key: format!("{scene_name}#image{}", image.index()),
                bytes: bytes.to_vec(),
                mime_type: Some(mime_type.to_string()),
            })
        }
        gltf::image::Source::Uri { uri, .. } => Ok(RawTexture::File(uri.to_string())),
    }
}

fn obj_mesh(model: tobj::Model) -> RawMesh {
    let mesh = model.mesh;
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = (!mesh.normals.is_empty()).then(|| {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    });
    // OBJ puts the uv origin at the bottom left, wgpu samples from the top left
    let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect()
    });
    let faces = mesh.indices.chunks(3).map(|c| c.to_vec()).collect();

    RawMesh {
        name: model.name,
        positions,
        tex_coords,
        normals,
        tangents: None,
        faces,
        material_index: mesh.material_id,
    }
}

fn obj_material(material: tobj::Material) -> RawMaterial {
    let mut textures = HashMap::new();
    let mut insert = |ty: TextureType, path: Option<&String>| {
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            textures.insert(ty, RawTexture::File(path.clone()));
        }
    };
    insert(TextureType::Diffuse, material.diffuse_texture.as_ref());
    insert(TextureType::Normals, material.normal_texture.as_ref());
    insert(TextureType::Specular, material.specular_texture.as_ref());
    insert(TextureType::Ambient, material.ambient_texture.as_ref());
    insert(TextureType::Opacity, material.dissolve_texture.as_ref());
    insert(
        TextureType::Displacement,
        material
            .unknown_param
            .get("disp")
            .or_else(|| material.unknown_param.get("map_disp")),
    );

    RawMaterial {
        name: material.name,
        textures,
        diffuse_color: material.diffuse,
        shininess: material.shininess,
        bump_scaling: None,
    }
}
