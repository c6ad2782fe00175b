use crate::{
    data_structures::{color::Color, material::{Material, TextureType}},
    resources::scene::{RawMaterial, RawTexture},
};

/// A texture the importer wants in the asset database.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRequest {
    /// Asset database key, also stored in the material slot.
    pub key: String,
    pub source: TextureSource,
    /// Normal and displacement maps skip sRGB decoding.
    pub linear: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// Path to load through [`crate::resources::load_binary`].
    File(String),
    Embedded {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl TextureSource {
    /// Extension hint for the image decoder.
    pub fn format_hint(&self) -> Option<&str> {
        match self {
            TextureSource::File(path) => path.rsplit_once('.').map(|(_, ext)| ext),
            TextureSource::Embedded { mime_type, .. } => mime_type
                .as_deref()
                .and_then(|mime| mime.rsplit_once('/'))
                .map(|(_, ext)| ext),
        }
    }
}

/// Result of [`parse_material`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedMaterial {
    pub material: Material,
    pub textures: Vec<TextureRequest>,
}

/// Convert a raw material into an engine material.
///
/// `tex_path` is prepended to file texture paths. Slots the raw material does
/// not fill keep the [`Material`] defaults, and so do absent scalars.
pub fn parse_material(raw: &RawMaterial, tex_path: &str) -> ParsedMaterial {
    let mut parsed = ParsedMaterial::default();

    for ty in TextureType::ALL {
        let Some(texture) = raw.textures.get(&ty) else {
            continue;
        };
        let (key, source) = match texture {
            RawTexture::File(path) => {
                let key = format!("{tex_path}{path}");
                (key.clone(), TextureSource::File(key))
            }
            RawTexture::Embedded {
                key,
                bytes,
                mime_type,
            } => (
                key.clone(),
                TextureSource::Embedded {
                    bytes: bytes.clone(),
                    mime_type: mime_type.clone(),
                },
            ),
        };
        parsed.material.set_map(ty, key.clone());
        parsed.textures.push(TextureRequest {
            key,
            source,
            linear: ty.is_linear(),
        });
    }

    if let Some(color) = raw.diffuse_color {
        parsed.material.diffuse_color = Color::from(color);
    }
    if let Some(shininess) = raw.shininess {
        parsed.material.shininess = shininess;
    }
    if let Some(scaling) = raw.bump_scaling {
        parsed.material.displacement_factor = scaling;
    }

    parsed
}
