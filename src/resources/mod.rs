//! Loading of models, materials and textures from external files.
//!
//! Import runs in two stages. Format adapters in [`scene`] read glTF or OBJ
//! into a [`RawScene`]. [`import_scene`] then turns that into engine data on
//! the CPU: [`MeshData`] with collision shapes, [`Material`]s and the list of
//! textures the materials need. [`load_model`] drives both stages and uploads
//! the result.

use std::collections::HashMap;

use crate::{
    data_structures::{material::Material, model::Model},
    error::{EngineError, Result},
    resources::{
        collision::{CollisionShapeBuilder, ShapeRequest},
        database::AssetDatabase,
        material::{TextureRequest, parse_material},
        mesh::{MeshData, parse_mesh},
        scene::RawScene,
    },
};

pub mod collision;
pub mod database;
pub mod material;
pub mod mesh;
pub mod meta;
pub mod scene;
pub mod texture;

pub use texture::{load_binary, load_string, load_texture};

/// CPU result of importing a scene.
#[derive(Clone, Debug, Default)]
pub struct ImportedScene {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<Material>,
    /// Textures referenced by `materials`, deduplicated by key.
    pub textures: Vec<TextureRequest>,
}

/// Convert a raw scene into meshes, materials and texture requests.
///
/// `tex_path` is prepended to texture file paths. Every mesh gets a
/// collision shape as described by `shape`.
pub fn import_scene(
    raw: &RawScene,
    tex_path: &str,
    shape: &ShapeRequest,
    builder: &dyn CollisionShapeBuilder,
) -> Result<ImportedScene> {
    let mut materials = Vec::with_capacity(raw.materials.len());
    let mut textures: Vec<TextureRequest> = Vec::new();
    for raw_material in &raw.materials {
        let parsed = parse_material(raw_material, tex_path);
        for request in parsed.textures {
            if !textures.iter().any(|t| t.key == request.key) {
                textures.push(request);
            }
        }
        materials.push(parsed.material);
    }

    let meshes = raw
        .meshes
        .iter()
        .map(|mesh| parse_mesh(mesh, &materials, shape, builder))
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "imported {} meshes, {} materials and {} textures",
        meshes.len(),
        materials.len(),
        textures.len()
    );
    Ok(ImportedScene {
        meshes,
        materials,
        textures,
    })
}

/// Directory part of `file_name` including the trailing separator.
pub fn texture_dir(file_name: &str) -> &str {
    match file_name.rfind('/') {
        Some(i) => &file_name[..=i],
        None => "",
    }
}

/// Read a raw scene from `file_name`, choosing the adapter by extension.
pub async fn load_raw_scene(file_name: &str) -> Result<RawScene> {
    let dir = texture_dir(file_name);
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "gltf" | "glb" => {
            let bytes = load_binary(file_name).await?;
            let document = gltf::Gltf::from_slice(&bytes)?;
            let mut external = HashMap::new();
            for buffer in document.buffers() {
                if let gltf::buffer::Source::Uri(uri) = buffer.source() {
                    let data = load_binary(&format!("{dir}{uri}")).await?;
                    external.insert(uri.to_string(), data);
                }
            }
            RawScene::from_gltf_slice(&bytes, file_name, |uri| {
                external
                    .get(uri)
                    .cloned()
                    .ok_or_else(|| EngineError::msg(format!("buffer {uri} was not loaded")))
            })
        }
        "obj" => {
            let text = load_string(file_name).await?;
            RawScene::from_obj(&text, |mtl| async move {
                load_string(&format!("{dir}{mtl}")).await.ok()
            })
            .await
        }
        other => Err(EngineError::msg(format!(
            "{file_name}: unsupported model format `{other}`"
        ))),
    }
}

/// Load a model file, its textures and upload everything to the GPU.
///
/// Textures land in `db` under their keys; already present keys are reused.
pub async fn load_model(
    file_name: &str,
    shape: &ShapeRequest,
    builder: &dyn CollisionShapeBuilder,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    db: &mut AssetDatabase,
) -> Result<Model> {
    let raw = load_raw_scene(file_name)
        .await
        .map_err(|e| EngineError::with_cause(format!("could not load model {file_name}"), e))?;
    let imported = import_scene(&raw, texture_dir(file_name), shape, builder)?;
    texture::load_requested_textures(&imported.textures, device, queue, db).await;
    Ok(Model::upload(device, file_name, &imported.meshes, db))
}
