//! Surface description of a mesh.

use serde::{Deserialize, Serialize};

use crate::data_structures::color::Color;

/// Kind of map a material slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureType {
    Diffuse,
    Normals,
    Specular,
    Ambient,
    Opacity,
    Displacement,
}

impl TextureType {
    pub const ALL: [TextureType; 6] = [
        TextureType::Diffuse,
        TextureType::Normals,
        TextureType::Specular,
        TextureType::Ambient,
        TextureType::Opacity,
        TextureType::Displacement,
    ];

    /// Maps holding vectors or heights must not be sRGB decoded.
    pub fn is_linear(&self) -> bool {
        matches!(self, TextureType::Normals | TextureType::Displacement)
    }
}

/// Texture references and scalar parameters of a surface.
///
/// Maps are asset database keys. An unset map is replaced by the database
/// default for its slot at bind time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse_map: Option<String>,
    pub normal_map: Option<String>,
    pub specular_map: Option<String>,
    pub ambient_occlusion_map: Option<String>,
    pub alpha_map: Option<String>,
    pub displacement_map: Option<String>,
    pub diffuse_color: Color,
    pub shininess: f32,
    pub displacement_factor: f32,
}

impl Material {
    pub fn map(&self, ty: TextureType) -> Option<&str> {
        match ty {
            TextureType::Diffuse => self.diffuse_map.as_deref(),
            TextureType::Normals => self.normal_map.as_deref(),
            TextureType::Specular => self.specular_map.as_deref(),
            TextureType::Ambient => self.ambient_occlusion_map.as_deref(),
            TextureType::Opacity => self.alpha_map.as_deref(),
            TextureType::Displacement => self.displacement_map.as_deref(),
        }
    }

    pub fn set_map(&mut self, ty: TextureType, key: impl Into<String>) {
        let key = Some(key.into());
        match ty {
            TextureType::Diffuse => self.diffuse_map = key,
            TextureType::Normals => self.normal_map = key,
            TextureType::Specular => self.specular_map = key,
            TextureType::Ambient => self.ambient_occlusion_map = key,
            TextureType::Opacity => self.alpha_map = key,
            TextureType::Displacement => self.displacement_map = key,
        }
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            diffuse_color: self.diffuse_color.to_rgba(),
            shininess: self.shininess,
            displacement_factor: self.displacement_factor,
            _padding: [0.0; 2],
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse_map: None,
            normal_map: None,
            specular_map: None,
            ambient_occlusion_map: None,
            alpha_map: None,
            displacement_map: None,
            diffuse_color: Color::WHITE,
            shininess: 0.0,
            displacement_factor: 1.0,
        }
    }
}

/// Scalar material parameters as laid out in the entity program.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub diffuse_color: [f32; 4],
    pub shininess: f32,
    pub displacement_factor: f32,
    // Uniform structs are padded to 16 bytes
    _padding: [f32; 2],
}
