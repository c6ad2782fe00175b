//! Frame rendering.
//!
//! [`MasterRenderer`] owns the shader programs and draws a [`Render`]
//! description in two phases. First every water surface gets its captures:
//! the scene above the water seen by the mirrored camera (reflection) and
//! the scene below it (refraction). Then the main pass draws entities,
//! water and GUI panes into the target view.

use instant::Instant;

use crate::{
    camera::{Camera, CameraUniform, Projection},
    data_structures::{framebuffer::FrameBuffer, texture::Texture},
    pipelines::{
        ShaderProgram,
        entity::EntityShader,
        gui::GuiShader,
        light::{LightResources, LightUniform},
        water::WaterShader,
    },
    render::{EntityDraw, Render},
    renderable::{sun::Sun, water::Water},
    resources::database::AssetDatabase,
};

pub struct MasterRenderer {
    entity: EntityShader,
    water: WaterShader,
    gui: GuiShader,
    light: LightResources,
    depth_texture: Texture,
    size: (u32, u32),
    last_frame: Instant,
    pub clear_colour: wgpu::Color,
}

impl MasterRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let light = LightResources::new(device, LightUniform::new([0.0, 1000.0, 0.0], [1.0; 3]));
        Self {
            entity: EntityShader::new(device, format, &light.bind_group_layout),
            water: WaterShader::new(device, format, &light.bind_group_layout),
            gui: GuiShader::new(device, format),
            light,
            depth_texture: Texture::create_depth_texture(device, [width, height], "depth_texture"),
            size: (width.max(1), height.max(1)),
            last_frame: Instant::now(),
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
        }
    }

    /// Resize the main depth buffer and the captures of `waters`.
    ///
    /// Zero sized windows (minimized) are ignored.
    pub fn resize<'w>(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
        waters: impl IntoIterator<Item = &'w mut Water>,
    ) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.depth_texture = Texture::create_depth_texture(device, [width, height], "depth_texture");
        for water in waters {
            water.resize(device, width, height);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Seconds since the previous call. Advances the wave animation of
    /// `waters` by that amount.
    pub fn advance<'w>(&mut self, waters: impl IntoIterator<Item = &'w mut Water>) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        for water in waters {
            water.update(dt);
        }
        dt
    }

    pub fn gui(&self) -> &GuiShader {
        &self.gui
    }

    pub fn gui_mut(&mut self) -> &mut GuiShader {
        &mut self.gui
    }

    /// Draw `render` into `target`, which must match the format the renderer
    /// was created with and the size of the last [`Self::resize`].
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        camera: &Camera,
        projection: &Projection,
        sun: &Sun,
        db: &AssetDatabase,
        render: Render,
    ) {
        let batches = render.into_batches();
        self.light.update(queue, sun);
        self.entity.prepare(device, queue, &batches.entities);

        for water in &batches.waters {
            self.capture_water(device, queue, camera, projection, water, &batches.entities);
        }

        let mut main_camera = CameraUniform::new();
        main_camera.update_view_proj(camera, projection);
        self.entity.set_camera(queue, &main_camera);
        self.water.set_camera(queue, &main_camera);
        self.gui.set_camera(queue, &main_camera);
        self.water.prepare_water(device, queue, &batches.waters, db);
        self.gui.prepare(device, queue, camera, &batches.guis, db);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.entity.draw(
                &mut render_pass,
                self.entity.pipeline(),
                self.light.bind_group(),
                &batches.entities,
            );
            self.water
                .draw(&mut render_pass, self.light.bind_group(), batches.waters.len());
            self.gui.draw(&mut render_pass, batches.guis.len());
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Fill the reflection and refraction framebuffers of `water`.
    ///
    /// Each capture is its own submission because both share the entity
    /// camera uniform.
    fn capture_water(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        projection: &Projection,
        water: &Water,
        draws: &[EntityDraw],
    ) {
        let [a, b, c, d] = water.clip_plane();
        if water.reflection_enabled {
            let mut uniform = CameraUniform::new();
            uniform.update_view_proj(&camera.reflected(water.y()), projection);
            let uniform = uniform.with_clip_plane([a, b, c, -d]);
            self.capture(device, queue, water.reflection_fbo(), &uniform, draws, "Reflection");
        }
        if water.refraction_enabled {
            let mut uniform = CameraUniform::new();
            uniform.update_view_proj(camera, projection);
            let uniform = uniform.with_clip_plane([-a, -b, -c, d]);
            self.capture(device, queue, water.refraction_fbo(), &uniform, draws, "Refraction");
        }
    }

    fn capture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        fbo: &FrameBuffer,
        camera: &CameraUniform,
        draws: &[EntityDraw],
        label: &str,
    ) {
        self.entity.set_camera(queue, camera);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&format!("{label} Encoder")),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("{label} Pass")),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &fbo.color_attachment().view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &fbo.depth_attachment().view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.entity.draw(
                &mut render_pass,
                self.entity.capture_pipeline(),
                self.light.bind_group(),
                draws,
            );
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}
