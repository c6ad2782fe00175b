//! Engine data structures.
//!
//! - `model` contains GPU meshes and models
//! - `material` describes surfaces as texture keys and scalars
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `framebuffer` pairs color and depth attachments for off-screen captures
//! - `transform` and `scene_graph` organize objects hierarchically
//! - `color` is the RGBA type shared by materials and renderables

pub mod color;
pub mod framebuffer;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
