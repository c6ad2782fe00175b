//! core-ngin
//!
//! A small wgpu rendering engine. It imports models from glTF and OBJ files
//! together with physics collision shapes, keeps textures in a keyed asset
//! database and draws scene graphs, water surfaces with reflection and
//! refraction, a sun light and hierarchical GUI panes.
//!
//! High-level modules
//! - `camera`: camera, projection and the camera uniform
//! - `config`: engine defaults (water, sun, moon, built-in textures)
//! - `context`: device and queue, headless or handed over by the application
//! - `data_structures`: textures, framebuffers, meshes, materials, scene graph
//! - `error`: the engine error type
//! - `pick`: GUI picking via pane ids
//! - `pipelines`: shader programs (entity, water, gui, light)
//! - `renderable`: water, sun and moon, GUI panes
//! - `render`: render composition and program batching
//! - `renderer`: the frame renderer
//! - `resources`: asset loading, scene import and collision shapes
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod renderable;
pub mod renderer;
pub mod resources;

pub use error::{EngineError, Result};

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;

/// Install the platform logger. Calling it more than once is harmless.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("warn"),
        )
        .try_init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Warn);
    }
}
