use cgmath::{Matrix4, SquareMatrix};

use crate::{
    config::{EngineConfig, WaterDefaults},
    data_structures::{
        color::Color,
        framebuffer::{FrameBuffer, scaled_resolution},
    },
    resources::database::{DEFAULT_NORMAL_MAP, TEXTURE_BLACK},
};

/// A horizontal water surface.
///
/// The water owns two framebuffers that the renderer fills every frame: the
/// scene mirrored at the water height (reflection) and the scene below the
/// water (refraction). Their size follows the window size times `quality`.
#[derive(Debug)]
pub struct Water {
    trans_mat: Matrix4<f32>,
    clip_plane: [f32; 4],
    pub transparency: f32,
    pub tiling: f32,
    pub dudv_map: String,
    pub normal_map: String,
    pub offset: f32,
    pub wave_strength: f32,
    pub soft_edge_depth: f32,
    /// Multiplied with the reflection/refraction mix.
    pub color: Color,
    /// Added on top of the lit result.
    pub additive_color: Color,
    pub shininess: f32,
    pub shine_damper: f32,
    pub reflection_enabled: bool,
    pub refraction_enabled: bool,
    wave_speed: f32,
    quality: f32,
    window_size: (u32, u32),
    reflection_fbo: FrameBuffer,
    refraction_fbo: FrameBuffer,
}

impl Water {
    /// Create a water surface for a window of `width` x `height` pixels.
    pub fn new(device: &wgpu::Device, config: &EngineConfig, width: u32, height: u32) -> Self {
        let WaterDefaults {
            wave_strength,
            color,
            soft_edge_depth,
            quality,
            transparency,
            tiling,
            shininess,
            shine_damper,
            wave_speed,
        } = config.water.clone();
        let (reflection_fbo, refraction_fbo) = create_fbos(device, width, height, quality);
        Self {
            trans_mat: Matrix4::identity(),
            clip_plane: [0.0, 1.0, 0.0, 0.0],
            transparency,
            tiling,
            dudv_map: TEXTURE_BLACK.to_string(),
            normal_map: DEFAULT_NORMAL_MAP.to_string(),
            offset: 0.0,
            wave_strength,
            soft_edge_depth,
            color: Color::from(color),
            additive_color: Color::BLACK,
            shininess,
            shine_damper,
            reflection_enabled: true,
            refraction_enabled: true,
            wave_speed,
            quality,
            window_size: (width, height),
            reflection_fbo,
            refraction_fbo,
        }
    }

    /// Change the capture quality. Recreates both framebuffers.
    pub fn set_quality(&mut self, device: &wgpu::Device, quality: f32) {
        self.quality = quality;
        self.recreate_fbos(device);
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// React to a window resize. Recreates both framebuffers.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.window_size = (width, height);
        self.recreate_fbos(device);
    }

    fn recreate_fbos(&mut self, device: &wgpu::Device) {
        let (width, height) = self.window_size;
        let (reflection, refraction) = create_fbos(device, width, height, self.quality);
        self.reflection_fbo = reflection;
        self.refraction_fbo = refraction;
    }

    /// Advance the wave animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.offset = advance_offset(self.offset, self.wave_speed, dt);
    }

    pub fn set_wave_speed(&mut self, wave_speed: f32) {
        self.wave_speed = wave_speed;
    }

    pub fn wave_speed(&self) -> f32 {
        self.wave_speed
    }

    pub fn set_x(&mut self, x: f32) {
        self.trans_mat.w.x = x;
    }

    /// Moves the surface and the clip plane used for the captures.
    pub fn set_y(&mut self, y: f32) {
        self.trans_mat.w.y = y;
        self.clip_plane[3] = y;
    }

    pub fn set_z(&mut self, z: f32) {
        self.trans_mat.w.z = z;
    }

    /// Uniform scale of the surface.
    pub fn set_scale(&mut self, scale: f32) {
        self.trans_mat.x.x = scale;
        self.trans_mat.y.y = scale;
        self.trans_mat.z.z = scale;
    }

    pub fn x(&self) -> f32 {
        self.trans_mat.w.x
    }

    pub fn y(&self) -> f32 {
        self.trans_mat.w.y
    }

    pub fn z(&self) -> f32 {
        self.trans_mat.w.z
    }

    pub fn scale(&self) -> f32 {
        self.trans_mat.x.x
    }

    pub fn trans_mat(&self) -> &Matrix4<f32> {
        &self.trans_mat
    }

    pub fn clip_plane(&self) -> [f32; 4] {
        self.clip_plane
    }

    pub fn reflection_fbo(&self) -> &FrameBuffer {
        &self.reflection_fbo
    }

    pub fn refraction_fbo(&self) -> &FrameBuffer {
        &self.refraction_fbo
    }
}

/// Wave offset after `dt` seconds at `wave_speed`, kept in `[0, 1)`.
pub fn advance_offset(offset: f32, wave_speed: f32, dt: f32) -> f32 {
    let next = (offset + wave_speed * dt).rem_euclid(1.0);
    // rem_euclid rounds tiny negative values up to exactly 1.0
    if next >= 1.0 { 0.0 } else { next }
}

fn create_fbos(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    quality: f32,
) -> (FrameBuffer, FrameBuffer) {
    let (w, h) = scaled_resolution(width, height, quality);
    (
        FrameBuffer::new(device, w, h, "water reflection"),
        FrameBuffer::new(device, w, h, "water refraction"),
    )
}
