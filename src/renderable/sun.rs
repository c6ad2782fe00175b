use cgmath::Vector3;

use crate::{
    config::EngineConfig,
    data_structures::color::Color,
    pipelines::light::{LightUniform, NO_ATTENUATION},
    resources::database::TEXTURE_WHITE,
};

/// A distant light body. By default its light reaches everything without
/// attenuation.
#[derive(Clone, Debug, PartialEq)]
pub struct Moon {
    pub position: Vector3<f32>,
    pub color: Color,
    pub size: f32,
    /// Texture of the visible disc.
    pub texture: String,
    /// Constant, linear and quadratic falloff. Intensity at distance `d` is
    /// `1 / (c + l * d + q * d * d)`.
    pub attenuation: [f32; 3],
}

impl Moon {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            position: Vector3::new(0.0, 1000.0, 0.0),
            color: Color::from(config.moon.color),
            size: config.moon.size,
            texture: TEXTURE_WHITE.to_string(),
            attenuation: NO_ATTENUATION,
        }
    }

    pub fn has_infinite_reach(&self) -> bool {
        self.attenuation == NO_ATTENUATION
    }

    pub fn to_uniform(&self) -> LightUniform {
        LightUniform::with_attenuation(
            self.position.into(),
            self.color.to_rgb(),
            self.attenuation,
        )
    }
}

/// The main light of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Sun {
    moon: Moon,
    lens_flare_enabled: bool,
}

impl Sun {
    pub fn new(config: &EngineConfig) -> Self {
        let mut moon = Moon::new(config);
        moon.size = config.sun.size;
        moon.color = Color::WHITE;
        Self {
            moon,
            lens_flare_enabled: true,
        }
    }

    pub fn is_lens_flare_enabled(&self) -> bool {
        self.lens_flare_enabled
    }

    pub fn set_lens_flare_enabled(&mut self, enabled: bool) {
        self.lens_flare_enabled = enabled;
    }
}

impl std::ops::Deref for Sun {
    type Target = Moon;

    fn deref(&self) -> &Moon {
        &self.moon
    }
}

impl std::ops::DerefMut for Sun {
    fn deref_mut(&mut self) -> &mut Moon {
        &mut self.moon
    }
}
