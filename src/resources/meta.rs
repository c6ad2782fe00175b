//! Persisted form of imported meshes.
//!
//! A [`MetaMesh`] holds everything [`MeshData`](crate::resources::mesh::MeshData)
//! knows except for the collision shape itself, which is stored as its
//! [`ShapeKind`] and rebuilt on load.

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::material::Material,
    error::Result,
    resources::collision::ShapeKind,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaMesh {
    pub name: String,
    pub vertices: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub normals: Vec<f32>,
    pub tangents: Vec<f32>,
    pub indices: Vec<u32>,
    pub material: Material,
    #[serde(default)]
    pub shape: ShapeKind,
}

impl MetaMesh {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
