#![allow(dead_code)]

use std::cell::Cell;

use core_ngin::{
    error::Result,
    resources::{
        collision::{CollisionShapeBuilder, ParryShapeBuilder},
        scene::RawMesh,
    },
};
use parry3d::shape::SharedShape;

/// A unit quad in the xy plane made of two triangles.
pub(crate) fn quad_mesh(name: &str) -> RawMesh {
    RawMesh {
        name: name.to_string(),
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        tex_coords: Some(vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]),
        normals: Some(vec![[0.0, 0.0, 1.0]; 4]),
        tangents: None,
        faces: vec![vec![0, 1, 2], vec![0, 2, 3]],
        material_index: None,
    }
}

/// A unit cube, enough points for a convex hull.
pub(crate) fn cube_mesh(name: &str) -> RawMesh {
    let positions = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let faces = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 6, 2],
        [3, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ]
    .iter()
    .map(|f| f.to_vec())
    .collect();
    RawMesh {
        name: name.to_string(),
        tex_coords: Some(positions.iter().map(|p: &[f32; 3]| [p[0], p[1]]).collect()),
        normals: Some(
            positions
                .iter()
                .map(|p: &[f32; 3]| {
                    let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt().max(1.0);
                    [p[0] / len, p[1] / len, p[2] / len]
                })
                .collect(),
        ),
        positions,
        tangents: None,
        faces,
        material_index: None,
    }
}

/// Forwards to parry and counts the calls it receives.
#[derive(Default)]
pub(crate) struct CountingBuilder {
    pub(crate) hulls: Cell<u32>,
    pub(crate) trimeshes: Cell<u32>,
}

impl CollisionShapeBuilder for CountingBuilder {
    fn convex_hull(&self, vertices: &[f32]) -> Result<SharedShape> {
        self.hulls.set(self.hulls.get() + 1);
        ParryShapeBuilder.convex_hull(vertices)
    }

    fn triangle_mesh(&self, vertices: &[f32], indices: &[u32]) -> Result<SharedShape> {
        self.trimeshes.set(self.trimeshes.get() + 1);
        ParryShapeBuilder.triangle_mesh(vertices, indices)
    }
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected {expected}, got {actual}"
    );
}

#[cfg(feature = "integration-tests")]
pub(crate) mod gpu {
    use core_ngin::context::Context;
    use image::RgbaImage;

    pub(crate) const WIDTH: u32 = 64;
    pub(crate) const HEIGHT: u32 = 48;

    /// Headless context, or `None` on machines without a usable adapter.
    pub(crate) fn context() -> Option<Context> {
        core_ngin::init_logger();
        match futures::executor::block_on(Context::headless(WIDTH, HEIGHT)) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("skipping GPU test: {e}");
                None
            }
        }
    }

    /// Copy an RGBA8 `target` of the context size back to the CPU.
    pub(crate) fn read_target(ctx: &Context, target: &wgpu::Texture) -> anyhow::Result<RgbaImage> {
        let unpadded = ctx.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: u64::from(padded * ctx.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(ctx.height),
                },
            },
            target.size(),
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        futures::executor::block_on(rx.receive())
            .ok_or_else(|| anyhow::anyhow!("readback mapping was cancelled"))??;

        let pixels = {
            let data = slice.get_mapped_range();
            data.chunks(padded as usize)
                .flat_map(|row| row[..unpadded as usize].to_vec())
                .collect::<Vec<u8>>()
        };
        buffer.unmap();
        RgbaImage::from_raw(ctx.width, ctx.height, pixels)
            .ok_or_else(|| anyhow::anyhow!("readback has the wrong size"))
    }
}
