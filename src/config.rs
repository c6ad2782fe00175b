//! Engine defaults.
//!
//! All tunable constants used when renderables are created live in
//! [`EngineConfig`]. The engine never reads configuration files itself; a host
//! application can deserialize the struct from whatever source it uses and
//! hand it to the constructors.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub water: WaterDefaults,
    pub sun: SunDefaults,
    pub moon: MoonDefaults,
    /// Edge length of the built-in solid textures.
    pub default_texture_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            water: WaterDefaults::default(),
            sun: SunDefaults::default(),
            moon: MoonDefaults::default(),
            default_texture_size: 2,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaterDefaults {
    pub wave_strength: f32,
    pub color: [f32; 3],
    pub soft_edge_depth: f32,
    /// Fraction of the window resolution used for the capture framebuffers.
    pub quality: f32,
    pub transparency: f32,
    pub tiling: f32,
    pub shininess: f32,
    pub shine_damper: f32,
    /// Offset units per second the renderer adds to animate the waves.
    pub wave_speed: f32,
}

impl Default for WaterDefaults {
    fn default() -> Self {
        Self {
            wave_strength: 0.02,
            color: [0.0, 0.3, 0.5],
            soft_edge_depth: 1.0,
            quality: 0.5,
            transparency: 1.0,
            tiling: 1.0,
            shininess: 0.6,
            shine_damper: 20.0,
            wave_speed: 0.03,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SunDefaults {
    pub size: f32,
}

impl Default for SunDefaults {
    fn default() -> Self {
        Self { size: 100.0 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MoonDefaults {
    pub size: f32,
    pub color: [f32; 3],
}

impl Default for MoonDefaults {
    fn default() -> Self {
        Self {
            size: 50.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}
