use cgmath::{InnerSpace, Vector2, Vector3};
use parry3d::shape::SharedShape;

use crate::{
    data_structures::material::Material,
    error::{EngineError, Result},
    resources::{
        collision::{CollisionShapeBuilder, ShapeKind, ShapeRequest},
        meta::MetaMesh,
        scene::RawMesh,
    },
};

/// CPU side mesh, ready to be uploaded.
///
/// Attributes are flat arrays: positions, normals and tangents hold xyz
/// triples, texture coordinates hold uv pairs. Every vertex has all four.
#[derive(Clone, Debug)]
pub struct MeshData {
    name: String,
    vertices: Vec<f32>,
    tex_coords: Vec<f32>,
    normals: Vec<f32>,
    tangents: Vec<f32>,
    indices: Vec<u32>,
    material: Material,
    shape: Option<SharedShape>,
    shape_kind: ShapeKind,
}

impl MeshData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn tangents(&self) -> &[f32] {
        &self.tangents
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn shape(&self) -> Option<&SharedShape> {
        self.shape.as_ref()
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape_kind
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Serializable description of this mesh.
    pub fn meta(&self) -> MetaMesh {
        MetaMesh {
            name: self.name.clone(),
            vertices: self.vertices.clone(),
            tex_coords: self.tex_coords.clone(),
            normals: self.normals.clone(),
            tangents: self.tangents.clone(),
            indices: self.indices.clone(),
            material: self.material.clone(),
            shape: self.shape_kind,
        }
    }

    /// Rebuild a mesh from its meta description.
    ///
    /// The collision shape is constructed again from its kind. Fixed shapes
    /// are not part of the meta data, so such meshes come back without one.
    pub fn from_meta(meta: MetaMesh, builder: &dyn CollisionShapeBuilder) -> Result<Self> {
        let vertex_count = meta.vertices.len() / 3;
        check_len(&meta.name, "positions", meta.vertices.len(), vertex_count * 3)?;
        check_len(&meta.name, "texture coordinates", meta.tex_coords.len(), vertex_count * 2)?;
        check_len(&meta.name, "normals", meta.normals.len(), vertex_count * 3)?;
        check_len(&meta.name, "tangents", meta.tangents.len(), vertex_count * 3)?;
        check_indices(&meta.name, &meta.indices, vertex_count)?;

        let request = match meta.shape {
            ShapeKind::None => ShapeRequest::None,
            ShapeKind::ConvexHull => ShapeRequest::ConvexHull,
            ShapeKind::TriangleMesh => ShapeRequest::TriangleMesh,
            ShapeKind::Fixed => {
                log::warn!(
                    "mesh {} used a fixed collision shape which cannot be restored",
                    meta.name
                );
                ShapeRequest::None
            }
        };
        let shape = request.build(&meta.vertices, &meta.indices, builder)?;

        Ok(Self {
            name: meta.name,
            vertices: meta.vertices,
            tex_coords: meta.tex_coords,
            normals: meta.normals,
            tangents: meta.tangents,
            indices: meta.indices,
            material: meta.material,
            shape,
            shape_kind: request.kind(),
        })
    }
}

/// Turn a raw mesh into [`MeshData`].
///
/// `materials` are the already parsed materials of the scene. A material
/// index outside of it yields a default material.
pub fn parse_mesh(
    raw: &RawMesh,
    materials: &[Material],
    shape: &ShapeRequest,
    builder: &dyn CollisionShapeBuilder,
) -> Result<MeshData> {
    let material = match raw.material_index.and_then(|i| materials.get(i)) {
        Some(material) => material.clone(),
        None => {
            if let Some(index) = raw.material_index {
                log::warn!(
                    "mesh {} references material {index} which does not exist, using the default",
                    raw.name
                );
            }
            Material::default()
        }
    };

    let vertex_count = raw.positions.len();
    let tex_coords = raw.tex_coords.as_ref().ok_or_else(|| EngineError::MissingAttribute {
        mesh: raw.name.clone(),
        attribute: "texture coordinates",
    })?;
    let normals = raw.normals.as_ref().ok_or_else(|| EngineError::MissingAttribute {
        mesh: raw.name.clone(),
        attribute: "normals",
    })?;
    check_len(&raw.name, "texture coordinates", tex_coords.len(), vertex_count)?;
    check_len(&raw.name, "normals", normals.len(), vertex_count)?;

    let mut indices = Vec::with_capacity(raw.faces.len() * 3);
    for (i, face) in raw.faces.iter().enumerate() {
        if face.len() != 3 {
            return Err(EngineError::msg(format!(
                "mesh {}: face {i} has {} vertices, only triangles are supported",
                raw.name,
                face.len()
            )));
        }
        indices.extend_from_slice(face);
    }
    check_indices(&raw.name, &indices, vertex_count)?;

    let tangents = match &raw.tangents {
        Some(tangents) => {
            check_len(&raw.name, "tangents", tangents.len(), vertex_count)?;
            tangents.clone()
        }
        None => generate_tangents(&raw.positions, tex_coords, normals, &indices),
    };

    let vertices: Vec<f32> = raw.positions.iter().flatten().copied().collect();
    let shape_value = shape.build(&vertices, &indices, builder).map_err(|e| {
        EngineError::with_cause(
            format!("mesh {}: collision shape could not be built", raw.name),
            e,
        )
    })?;

    Ok(MeshData {
        name: raw.name.clone(),
        tex_coords: tex_coords.iter().flatten().copied().collect(),
        normals: normals.iter().flatten().copied().collect(),
        tangents: tangents.iter().flatten().copied().collect(),
        vertices,
        indices,
        material,
        shape: shape_value,
        shape_kind: shape.kind(),
    })
}

/// Per-vertex tangents averaged over the adjacent triangles.
///
/// Triangles with degenerate uvs do not contribute. Vertices without any
/// usable triangle get an arbitrary tangent orthogonal to their normal.
fn generate_tangents(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    normals: &[[f32; 3]],
    indices: &[u32],
) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    let mut counts = vec![0u32; positions.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let pos0: Vector3<f32> = positions[i0].into();
        let pos1: Vector3<f32> = positions[i1].into();
        let pos2: Vector3<f32> = positions[i2].into();
        let uv0: Vector2<f32> = tex_coords[i0].into();
        let uv1: Vector2<f32> = tex_coords[i1].into();
        let uv2: Vector2<f32> = tex_coords[i2].into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        // delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) / det;

        for i in [i0, i1, i2] {
            sums[i] += tangent;
            counts[i] += 1;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(normals)
        .map(|((sum, count), normal)| {
            if count > 0 && sum.magnitude2() > 0.0 {
                (sum / count as f32).into()
            } else {
                orthogonal(Vector3::from(*normal)).into()
            }
        })
        .collect()
}

fn orthogonal(normal: Vector3<f32>) -> Vector3<f32> {
    let axis = if normal.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let tangent = normal.cross(axis);
    if tangent.magnitude2() > 0.0 {
        tangent.normalize()
    } else {
        Vector3::unit_x()
    }
}

fn check_len(mesh: &str, attribute: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(EngineError::msg(format!(
            "mesh {mesh}: expected {expected} {attribute}, found {actual}"
        )));
    }
    Ok(())
}

fn check_indices(mesh: &str, indices: &[u32], vertex_count: usize) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(EngineError::msg(format!(
            "mesh {mesh}: {} indices do not form triangles",
            indices.len()
        )));
    }
    match indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(bad) => Err(EngineError::msg(format!(
            "mesh {mesh}: index {bad} is out of range for {vertex_count} vertices"
        ))),
        None => Ok(()),
    }
}
