//! Off-screen framebuffers used for reflection and refraction captures.

use crate::data_structures::texture::Texture;

/// A color attachment plus a depth attachment of the same size.
///
/// Recreating a framebuffer allocates new GPU memory; it happens on quality
/// changes and window resizes, never per frame.
#[derive(Debug)]
pub struct FrameBuffer {
    color: Texture,
    depth: Texture,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        log::debug!("creating framebuffer {label} ({width}x{height})");
        let color = Texture::create_render_target(
            device,
            [width, height],
            &format!("{label} color attachment"),
        );
        let depth = Texture::create_depth_texture(
            device,
            [width, height],
            &format!("{label} depth attachment"),
        );
        Self {
            color,
            depth,
            width,
            height,
        }
    }

    /// Texture the scene is captured into.
    pub fn color_attachment(&self) -> &Texture {
        &self.color
    }

    pub fn depth_attachment(&self) -> &Texture {
        &self.depth
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Capture resolution for a window of `width` x `height` at `quality`.
///
/// The result is truncated and never smaller than one pixel per axis.
pub fn scaled_resolution(width: u32, height: u32, quality: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * quality) as u32).max(1);
    (scale(width), scale(height))
}
