//! GUI picking.
//!
//! The picking pass renders the pick id of every pane into an `R32Uint`
//! texture of window size, clears everything else to zero and reads back the
//! texel under the cursor:
//! 1. prepare the panes with the GUI program and draw them with its pick pipeline
//! 2. copy the single texel under the cursor into a mappable buffer
//! 3. map the buffer and decode the id; zero means no pane
//!
//! Compare the result with [`GuiPane::is_mouse_over`].

use std::iter;

use crate::{
    camera::{Camera, CameraUniform, Projection},
    error::{EngineError, Result},
    pipelines::{
        ShaderProgram,
        gui::{GuiShader, PICK_FORMAT},
    },
    renderable::gui::GuiPane,
    resources::database::AssetDatabase,
};

// Row pitch of texture to buffer copies must be a multiple of 256 bytes.
const ROW_PITCH: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Id target and readback buffer of the picking pass.
pub struct GuiPicker {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    buffer: wgpu::Buffer,
    size: (u32, u32),
}

impl GuiPicker {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = (width.max(1), height.max(1));
        let (texture, view) = mk_pick_texture(device, size);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick readback buffer"),
            size: ROW_PITCH as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            texture,
            view,
            buffer,
            size,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        let (texture, view) = mk_pick_texture(device, self.size);
        self.texture = texture;
        self.view = view;
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Pick id of the topmost pane under `cursor` (physical pixels), if any.
    ///
    /// Cursors outside the window pick nothing.
    pub async fn pick(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        gui: &mut GuiShader,
        camera: &Camera,
        projection: &Projection,
        panes: &[&GuiPane],
        db: &AssetDatabase,
        cursor: (f64, f64),
    ) -> Result<Option<u32>> {
        let Some((x, y)) = self.texel(cursor) else {
            return Ok(None);
        };

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera, projection);
        gui.set_camera(queue, &uniform);
        gui.prepare(device, queue, camera, panes, db);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pick Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            gui.draw_pick(&mut render_pass, panes.len());
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(ROW_PITCH),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(iter::once(encoder.finish()));

        let id = read_id(&self.buffer, device).await?;
        log::debug!("picked gui id {id}");
        Ok((id != 0).then_some(id))
    }

    fn texel(&self, (x, y): (f64, f64)) -> Option<(u32, u32)> {
        let (width, height) = self.size;
        let inside = x >= 0.0 && y >= 0.0 && x < f64::from(width) && y < f64::from(height);
        inside.then_some((x as u32, y as u32))
    }
}

fn mk_pick_texture(device: &wgpu::Device, (width, height): (u32, u32)) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Pick texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: PICK_FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

async fn read_id(buffer: &wgpu::Buffer, device: &wgpu::Device) -> Result<u32> {
    let buffer_slice = buffer.slice(..);
    // NOTE: We have to create the mapping THEN device.poll() before await
    // the future. Otherwise the application will freeze.
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only goes away with the whole pick call.
        let _ = tx.send(result);
    });
    #[cfg(target_arch = "wasm32")]
    device
        .poll(wgpu::PollType::Poll)
        .map_err(|e| EngineError::with_cause("failed to poll the device", e))?;
    #[cfg(not(target_arch = "wasm32"))]
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|e| EngineError::with_cause("failed to poll the device", e))?;
    rx.receive()
        .await
        .ok_or_else(|| EngineError::msg("pick buffer mapping was cancelled"))?
        .map_err(|e| EngineError::with_cause("failed to map the pick buffer", e))?;

    let id = {
        let data = buffer_slice.get_mapped_range();
        u32::from_le_bytes([data[0], data[1], data[2], data[3]])
    };
    buffer.unmap();
    Ok(id)
}
