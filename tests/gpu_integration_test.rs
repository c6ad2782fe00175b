#![cfg(feature = "integration-tests")]

mod common;

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};
use common::{
    gpu::{HEIGHT, WIDTH, context, read_target},
    quad_mesh,
};
use core_ngin::{
    camera::{Camera, Projection},
    config::EngineConfig,
    data_structures::model::Model,
    pick::GuiPicker,
    render::{EntityDraw, Render},
    renderable::{gui::GuiPane, sun::Sun, water::Water},
    renderer::MasterRenderer,
    resources::{
        collision::{ParryShapeBuilder, ShapeRequest},
        database::{AssetDatabase, TEXTURE_WHITE},
        mesh::parse_mesh,
    },
};

fn view() -> (Camera, Projection) {
    (
        Camera::new((0.0, 2.0, 5.0), Deg(-90.0), Deg(-10.0)),
        Projection::new(WIDTH, HEIGHT, Deg(45.0), 0.1, 100.0),
    )
}

#[test]
fn should_size_water_captures_by_quality() {
    let Some(ctx) = context() else { return };
    let config = EngineConfig::default();
    let mut water = Water::new(&ctx.device, &config, WIDTH, HEIGHT);

    assert_eq!(water.reflection_fbo().width(), WIDTH / 2);
    assert_eq!(water.refraction_fbo().height(), HEIGHT / 2);

    water.set_quality(&ctx.device, 0.25);
    assert_eq!(water.reflection_fbo().width(), WIDTH / 4);
    assert_eq!(water.refraction_fbo().height(), HEIGHT / 4);

    water.resize(&ctx.device, 128, 96);
    assert_eq!(water.reflection_fbo().width(), 32);

    water.set_y(1.5);
    assert_eq!(water.y(), 1.5);
    assert_eq!(water.clip_plane(), [0.0, 1.0, 0.0, 1.5]);
}

#[test]
fn should_place_water_surface() {
    let Some(ctx) = context() else { return };
    let mut water = Water::new(&ctx.device, &EngineConfig::default(), WIDTH, HEIGHT);
    assert_eq!(water.clip_plane(), [0.0, 1.0, 0.0, 0.0]);

    water.set_x(2.0);
    water.set_z(-3.0);
    water.set_scale(4.0);
    assert_eq!((water.x(), water.z(), water.scale()), (2.0, -3.0, 4.0));
    let m = water.trans_mat();
    assert_eq!((m.w.x, m.w.y, m.w.z), (2.0, 0.0, -3.0));
    assert_eq!((m.x.x, m.y.y, m.z.z), (4.0, 4.0, 4.0));
    assert_eq!(water.clip_plane(), [0.0, 1.0, 0.0, 0.0]);

    water.set_y(-0.5);
    assert_eq!(water.clip_plane(), [0.0, 1.0, 0.0, -0.5]);
    assert_eq!(water.trans_mat().w.x, 2.0);

    water.set_wave_speed(0.5);
    water.offset = 0.9;
    water.update(0.5);
    assert!((water.offset - 0.15).abs() < 1e-5);
}

#[test]
fn should_render_composed_frame() -> anyhow::Result<()> {
    let Some(ctx) = context() else { return Ok(()) };
    let config = EngineConfig::default();
    let db = AssetDatabase::new(&ctx.device, &ctx.queue, config.default_texture_size);

    let mesh = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::None, &ParryShapeBuilder)?;
    let model = Model::upload(&ctx.device, "quad", &[mesh], &db);
    let mut water = Water::new(&ctx.device, &config, WIDTH, HEIGHT);
    water.set_scale(10.0);
    let mut pane = GuiPane::new();
    pane.set_scale_x(0.2);
    pane.set_scale_y(0.1);
    pane.texture = "not/loaded.png".into();
    pane.update_transforms(&Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));

    let (camera, projection) = view();
    let sun = Sun::new(&config);
    let mut renderer = MasterRenderer::new(&ctx.device, ctx.format, WIDTH, HEIGHT);
    renderer.advance([&mut water]);
    assert!(water.offset >= 0.0 && water.offset < 1.0);

    let target = ctx.create_target();
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let draws = vec![
        EntityDraw {
            model: &model,
            world: Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0)),
        },
        EntityDraw {
            model: &model,
            world: Matrix4::from_translation(Vector3::new(0.0, -1.0, 0.0)),
        },
    ];
    for _ in 0..2 {
        renderer.render(
            &ctx.device,
            &ctx.queue,
            &target_view,
            &camera,
            &projection,
            &sun,
            &db,
            Render::Composed(vec![
                Render::Entities(draws.clone()),
                (&water).into(),
                (&pane).into(),
            ]),
        );
    }
    ctx.device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })?;

    renderer.resize(&ctx.device, 0, 0, [&mut water]);
    assert_eq!(renderer.size(), (WIDTH, HEIGHT));
    renderer.resize(&ctx.device, WIDTH * 2, HEIGHT * 2, [&mut water]);
    assert_eq!(renderer.size(), (WIDTH * 2, HEIGHT * 2));
    assert_eq!(water.reflection_fbo().width(), WIDTH);
    Ok(())
}

#[test]
fn should_draw_entity_above_tinted_water() -> anyhow::Result<()> {
    let Some(ctx) = context() else { return Ok(()) };
    let config = EngineConfig::default();
    let db = AssetDatabase::new(&ctx.device, &ctx.queue, config.default_texture_size);

    let mesh = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::None, &ParryShapeBuilder)?;
    let model = Model::upload(&ctx.device, "quad", &[mesh], &db);
    let mut water = Water::new(&ctx.device, &config, WIDTH, HEIGHT);
    water.set_scale(100.0);
    water.shininess = 0.0;

    // Level camera: the horizon is the middle row, water fills the lower half.
    let camera = Camera::new((0.0, 2.0, 5.0), Deg(-90.0), Deg(0.0));
    let projection = Projection::new(WIDTH, HEIGHT, Deg(45.0), 0.1, 100.0);
    let mut renderer = MasterRenderer::new(&ctx.device, ctx.format, WIDTH, HEIGHT);
    let target = ctx.create_target();
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
    renderer.render(
        &ctx.device,
        &ctx.queue,
        &target_view,
        &camera,
        &projection,
        &Sun::new(&config),
        &db,
        Render::Composed(vec![
            Render::Entities(vec![EntityDraw {
                model: &model,
                world: Matrix4::from_translation(Vector3::new(-0.5, 2.2, 0.0)),
            }]),
            (&water).into(),
        ]),
    );
    let image = read_target(&ctx, &target)?;

    // Clear colour (0.1, 0.2, 0.3) stored in sRGB.
    let sky = image.get_pixel(0, 0).0;
    for (actual, expected) in sky.iter().zip([89u8, 124, 149]) {
        assert!(actual.abs_diff(expected) <= 2, "sky pixel {sky:?}");
    }

    // White material under white light stays grey.
    let entity = image.get_pixel(WIDTH / 2, HEIGHT / 3).0;
    let (lo, hi) = (entity[..3].iter().min(), entity[..3].iter().max());
    assert!(hi.zip(lo).is_some_and(|(hi, lo)| hi - lo <= 2), "entity pixel {entity:?}");
    assert_ne!(entity[..3], sky[..3]);

    // The water color has no red and more blue than green.
    let water_pixel = image.get_pixel(WIDTH / 2, HEIGHT - 4).0;
    assert!(water_pixel[0] <= 2, "water pixel {water_pixel:?}");
    assert!(water_pixel[2] > water_pixel[1], "water pixel {water_pixel:?}");
    assert!(water_pixel[1] > water_pixel[0], "water pixel {water_pixel:?}");
    Ok(())
}

#[test]
fn should_pick_pane_under_cursor() -> anyhow::Result<()> {
    let Some(ctx) = context() else { return Ok(()) };
    let config = EngineConfig::default();
    let db = AssetDatabase::new(&ctx.device, &ctx.queue, config.default_texture_size);
    let mut renderer = MasterRenderer::new(&ctx.device, ctx.format, WIDTH, HEIGHT);
    let picker = GuiPicker::new(&ctx.device, WIDTH, HEIGHT);
    let (camera, projection) = view();

    let mut pane = GuiPane::new();
    pane.set_scale_x(0.25);
    pane.set_scale_y(0.25);
    pane.update_transforms(&Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));
    let panes = pane.flatten();

    let mut pick = |cursor| {
        futures::executor::block_on(picker.pick(
            &ctx.device,
            &ctx.queue,
            renderer.gui_mut(),
            &camera,
            &projection,
            &panes,
            &db,
            cursor,
        ))
    };

    let center = (f64::from(WIDTH) / 2.0, f64::from(HEIGHT) / 2.0);
    let picked = pick(center)?;
    assert_eq!(picked, Some(pane.pick_id()));
    assert!(pane.is_mouse_over(picked));

    assert_eq!(pick((1.0, 1.0))?, None);
    assert_eq!(pick((-5.0, 10.0))?, None);
    assert_eq!(pick((f64::from(WIDTH), 0.0))?, None);
    Ok(())
}

#[test]
fn should_reset_gui_textures_for_new_database() {
    let Some(ctx) = context() else { return };
    let config = EngineConfig::default();
    let mut renderer = MasterRenderer::new(&ctx.device, ctx.format, WIDTH, HEIGHT);
    let (camera, _) = view();

    let black = GuiPane::new();
    let mut white = GuiPane::new();
    white.texture = TEXTURE_WHITE.into();

    let first = AssetDatabase::new(&ctx.device, &ctx.queue, config.default_texture_size);
    let gui = renderer.gui_mut();
    gui.prepare(&ctx.device, &ctx.queue, &camera, &[&black, &white], &first);
    assert_eq!(gui.cached_textures(), 2);
    gui.prepare(&ctx.device, &ctx.queue, &camera, &[&black, &white], &first);
    assert_eq!(gui.cached_textures(), 2);

    let second = AssetDatabase::new(&ctx.device, &ctx.queue, config.default_texture_size);
    assert_ne!(first.id(), second.id());
    gui.prepare(&ctx.device, &ctx.queue, &camera, &[&black], &second);
    assert_eq!(gui.cached_textures(), 1);
}
