//! GPU device and queue.
//!
//! The engine does not own a window. Applications that present to a surface
//! build the device themselves and hand it over with [`Context::from_parts`];
//! tools and tests use [`Context::headless`].

use crate::{
    data_structures::texture::Texture,
    error::{EngineError, Result},
};

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Color format the renderer draws the main pass in.
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl Context {
    pub fn from_parts(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            device,
            queue,
            format,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Create a device without a surface. The main pass format is
    /// [`Texture::TARGET_FORMAT`].
    pub async fn headless(width: u32, height: u32) -> Result<Self> {
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EngineError::with_cause("no suitable GPU adapter", e))?;
        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .map_err(|e| EngineError::with_cause("failed to create the GPU device", e))?;

        Ok(Self::from_parts(device, queue, Texture::TARGET_FORMAT, width, height))
    }

    /// A color target in [`Self::format`] of the context size, for offscreen
    /// frames.
    pub fn create_target(&self) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen target"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }
}
