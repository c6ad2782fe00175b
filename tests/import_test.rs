mod common;

use std::collections::HashMap;

use common::{CountingBuilder, assert_close, cube_mesh, quad_mesh};
use core_ngin::{
    data_structures::{color::Color, material::{Material, TextureType}},
    error::EngineError,
    resources::{
        collision::{CollisionShapeBuilder, ParryShapeBuilder, ShapeKind, ShapeRequest},
        import_scene,
        material::{TextureSource, parse_material},
        mesh::parse_mesh,
        scene::{RawMaterial, RawScene, RawTexture},
        texture_dir,
    },
};
use parry3d::shape::{Ball, ShapeType, SharedShape};

#[test]
fn should_flatten_attributes_with_fixed_strides() -> anyhow::Result<()> {
    let mesh = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::None, &ParryShapeBuilder)?;

    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.vertices().len(), 4 * 3);
    assert_eq!(mesh.tex_coords().len(), 4 * 2);
    assert_eq!(mesh.normals().len(), 4 * 3);
    assert_eq!(mesh.tangents().len(), 4 * 3);
    assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
    assert_eq!(&mesh.vertices()[6..9], &[1.0, 1.0, 0.0]);
    assert_eq!(&mesh.tex_coords()[2..4], &[1.0, 1.0]);
    Ok(())
}

#[test]
fn should_generate_tangents_along_u() -> anyhow::Result<()> {
    let mesh = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::None, &ParryShapeBuilder)?;

    for tangent in mesh.tangents().chunks_exact(3) {
        assert_close(tangent[0], 1.0);
        assert_close(tangent[1], 0.0);
        assert_close(tangent[2], 0.0);
    }
    Ok(())
}

#[test]
fn should_keep_tangents_of_the_source() -> anyhow::Result<()> {
    let mut raw = quad_mesh("quad");
    raw.tangents = Some(vec![[0.0, 1.0, 0.0]; 4]);
    let mesh = parse_mesh(&raw, &[], &ShapeRequest::None, &ParryShapeBuilder)?;

    assert_eq!(&mesh.tangents()[..3], &[0.0, 1.0, 0.0]);
    Ok(())
}

#[test]
fn should_use_default_material_for_out_of_range_index() -> anyhow::Result<()> {
    let mut raw = quad_mesh("quad");
    raw.material_index = Some(3);
    let materials = vec![Material {
        shininess: 12.0,
        ..Default::default()
    }];
    let mesh = parse_mesh(&raw, &materials, &ShapeRequest::None, &ParryShapeBuilder)?;
    assert_eq!(mesh.material(), &Material::default());

    raw.material_index = Some(0);
    let mesh = parse_mesh(&raw, &materials, &ShapeRequest::None, &ParryShapeBuilder)?;
    assert_eq!(mesh.material().shininess, 12.0);
    Ok(())
}

#[test]
fn should_reject_meshes_without_normals() {
    let mut raw = quad_mesh("flat");
    raw.normals = None;
    let result = parse_mesh(&raw, &[], &ShapeRequest::None, &ParryShapeBuilder);

    assert!(matches!(
        result,
        Err(EngineError::MissingAttribute { ref mesh, attribute: "normals" }) if mesh == "flat"
    ));
}

#[test]
fn should_reject_non_triangle_faces_and_bad_indices() {
    let mut raw = quad_mesh("quad");
    raw.faces = vec![vec![0, 1, 2, 3]];
    assert!(parse_mesh(&raw, &[], &ShapeRequest::None, &ParryShapeBuilder).is_err());

    let mut raw = quad_mesh("quad");
    raw.faces = vec![vec![0, 1, 7]];
    assert!(parse_mesh(&raw, &[], &ShapeRequest::None, &ParryShapeBuilder).is_err());
}

#[test]
fn should_build_requested_collision_shapes() -> anyhow::Result<()> {
    let builder = CountingBuilder::default();

    let hull = parse_mesh(&cube_mesh("cube"), &[], &ShapeRequest::ConvexHull, &builder)?;
    assert_eq!(hull.shape_kind(), ShapeKind::ConvexHull);
    assert_eq!(
        hull.shape().map(|s| s.shape_type()),
        Some(ShapeType::ConvexPolyhedron)
    );

    let trimesh = parse_mesh(&cube_mesh("cube"), &[], &ShapeRequest::TriangleMesh, &builder)?;
    assert_eq!(trimesh.shape().map(|s| s.shape_type()), Some(ShapeType::TriMesh));

    let none = parse_mesh(&cube_mesh("cube"), &[], &ShapeRequest::None, &builder)?;
    assert!(none.shape().is_none());

    assert_eq!(builder.hulls.get(), 1);
    assert_eq!(builder.trimeshes.get(), 1);
    Ok(())
}

#[test]
fn should_pass_fixed_shapes_through() -> anyhow::Result<()> {
    let builder = CountingBuilder::default();
    let request = ShapeRequest::Fixed(SharedShape::new(Ball::new(2.0)));
    let mesh = parse_mesh(&quad_mesh("quad"), &[], &request, &builder)?;

    let ball = mesh
        .shape()
        .and_then(|s| s.as_ball())
        .expect("fixed shape should be kept");
    assert_eq!(ball.radius, 2.0);
    assert_eq!(mesh.shape_kind(), ShapeKind::Fixed);
    assert_eq!(builder.hulls.get() + builder.trimeshes.get(), 0);
    Ok(())
}

#[test]
fn should_fail_on_unusable_collision_data() {
    let mut raw = quad_mesh("triangle");
    raw.positions.truncate(3);
    if let Some(tex_coords) = raw.tex_coords.as_mut() {
        tex_coords.truncate(3);
    }
    if let Some(normals) = raw.normals.as_mut() {
        normals.truncate(3);
    }
    raw.faces = vec![vec![0, 1, 2]];

    let err = parse_mesh(&raw, &[], &ShapeRequest::ConvexHull, &ParryShapeBuilder)
        .expect_err("three points have no convex hull");
    let source = std::error::Error::source(&err).expect("collision error is chained");
    assert!(matches!(
        source.downcast_ref::<EngineError>(),
        Some(EngineError::Collision { .. })
    ));
}

#[test]
fn should_reject_hull_of_coplanar_points() {
    let square = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
    let err = ParryShapeBuilder
        .convex_hull(&square)
        .expect_err("a flat square has no volume");
    assert!(matches!(err, EngineError::Collision { .. }));

    let line = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0];
    assert!(ParryShapeBuilder.convex_hull(&line).is_err());

    let err = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::ConvexHull, &ParryShapeBuilder)
        .expect_err("the quad is flat");
    let source = std::error::Error::source(&err).expect("collision error is chained");
    assert!(matches!(
        source.downcast_ref::<EngineError>(),
        Some(EngineError::Collision { .. })
    ));
}

#[test]
fn should_chain_cause_of_collision_error() {
    let err = EngineError::Collision {
        message: "triangle mesh was rejected".into(),
        cause: Some(Box::new(std::io::Error::other("bad topology"))),
    };
    let source = std::error::Error::source(&err).expect("cause is kept");
    assert_eq!(source.to_string(), "bad topology");
    assert!(std::error::Error::source(&EngineError::collision("flat")).is_none());
}

#[test]
fn should_reject_triangle_mesh_without_area() {
    let err = ParryShapeBuilder
        .triangle_mesh(&[0.0; 9], &[0, 1, 2])
        .expect_err("collapsed triangle");
    assert!(matches!(err, EngineError::Collision { .. }));

    let mut vertices = vec![0.0; 9];
    vertices.extend_from_slice(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let shape = ParryShapeBuilder.triangle_mesh(&vertices, &[0, 1, 2, 3, 4, 5]);
    assert!(shape.is_ok());
}

fn raw_material() -> RawMaterial {
    let mut textures = HashMap::new();
    textures.insert(TextureType::Diffuse, RawTexture::File("wood.png".into()));
    textures.insert(TextureType::Normals, RawTexture::File("wood_n.png".into()));
    textures.insert(TextureType::Specular, RawTexture::File("wood_s.png".into()));
    textures.insert(
        TextureType::Opacity,
        RawTexture::Embedded {
            key: "hut.glb#image2".into(),
            bytes: vec![1, 2, 3],
            mime_type: Some("image/png".into()),
        },
    );
    RawMaterial {
        name: "wood".into(),
        textures,
        diffuse_color: None,
        shininess: None,
        bump_scaling: None,
    }
}

#[test]
fn should_put_each_map_in_its_own_slot() {
    let parsed = parse_material(&raw_material(), "models/hut/");
    let material = &parsed.material;

    assert_eq!(material.diffuse_map.as_deref(), Some("models/hut/wood.png"));
    assert_eq!(material.normal_map.as_deref(), Some("models/hut/wood_n.png"));
    assert_eq!(material.specular_map.as_deref(), Some("models/hut/wood_s.png"));
    assert_eq!(material.alpha_map.as_deref(), Some("hut.glb#image2"));
    assert_eq!(material.ambient_occlusion_map, None);
    assert_eq!(material.displacement_map, None);

    assert_eq!(parsed.textures.len(), 4);
    let normal = parsed
        .textures
        .iter()
        .find(|t| t.key == "models/hut/wood_n.png")
        .expect("normal map requested");
    assert!(normal.linear);
    assert_eq!(normal.source, TextureSource::File("models/hut/wood_n.png".into()));
    let embedded = parsed
        .textures
        .iter()
        .find(|t| t.key == "hut.glb#image2")
        .expect("embedded map requested");
    assert_eq!(embedded.source.format_hint(), Some("png"));
}

#[test]
fn should_keep_defaults_for_absent_scalars() {
    let parsed = parse_material(&raw_material(), "");
    let defaults = Material::default();
    assert_eq!(parsed.material.diffuse_color, defaults.diffuse_color);
    assert_eq!(parsed.material.shininess, defaults.shininess);
    assert_eq!(parsed.material.displacement_factor, defaults.displacement_factor);

    let mut raw = raw_material();
    raw.diffuse_color = Some([0.5, 0.25, 0.0]);
    raw.shininess = Some(32.0);
    raw.bump_scaling = Some(0.3);
    let parsed = parse_material(&raw, "");
    assert!(parsed.material.diffuse_color.compare(&Color::rgb(0.5, 0.25, 0.0)));
    assert_eq!(parsed.material.shininess, 32.0);
    assert_eq!(parsed.material.displacement_factor, 0.3);
}

#[test]
fn should_deduplicate_texture_requests() -> anyhow::Result<()> {
    let mut mesh = quad_mesh("quad");
    mesh.material_index = Some(1);
    let scene = RawScene {
        meshes: vec![mesh],
        materials: vec![raw_material(), raw_material()],
    };
    let imported = import_scene(&scene, "models/", &ShapeRequest::None, &ParryShapeBuilder)?;

    assert_eq!(imported.materials.len(), 2);
    assert_eq!(imported.textures.len(), 4);
    assert_eq!(
        imported.meshes[0].material().diffuse_map.as_deref(),
        Some("models/wood.png")
    );
    Ok(())
}

#[test]
fn should_split_texture_dir() {
    assert_eq!(texture_dir("models/hut/hut.gltf"), "models/hut/");
    assert_eq!(texture_dir("hut.obj"), "");
}

const QUAD_OBJ: &str = "mtllib quad.mtl
o Quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl water
f 1/1/1 2/2/1 3/3/1 4/4/1
";

const QUAD_MTL: &str = "newmtl water
Kd 0.1 0.2 0.3
Ns 42
map_Kd diffuse.png
map_Bump normal.png
disp height.png
";

#[test]
fn should_import_obj_with_materials() -> anyhow::Result<()> {
    let raw = futures::executor::block_on(RawScene::from_obj(QUAD_OBJ, |name| async move {
        (name == "quad.mtl").then(|| QUAD_MTL.to_string())
    }))?;

    assert_eq!(raw.meshes.len(), 1);
    assert_eq!(raw.materials.len(), 1);
    let tex_coords = raw.meshes[0].tex_coords.as_ref().expect("obj has uvs");
    assert!(tex_coords.contains(&[0.0, 1.0]));

    let imported = import_scene(&raw, "models/", &ShapeRequest::TriangleMesh, &ParryShapeBuilder)?;
    let mesh = &imported.meshes[0];
    assert_eq!(mesh.indices().len(), 6);
    assert!(mesh.shape().is_some());

    let material = mesh.material();
    assert_eq!(material.diffuse_map.as_deref(), Some("models/diffuse.png"));
    assert_eq!(material.normal_map.as_deref(), Some("models/normal.png"));
    assert_eq!(material.displacement_map.as_deref(), Some("models/height.png"));
    assert_eq!(material.shininess, 42.0);
    assert!(material.diffuse_color.compare(&Color::rgb(0.1, 0.2, 0.3)));
    Ok(())
}

#[test]
fn should_import_obj_without_material_library() -> anyhow::Result<()> {
    let raw = futures::executor::block_on(RawScene::from_obj(QUAD_OBJ, |_| async { None }))?;
    let imported = import_scene(&raw, "", &ShapeRequest::None, &ParryShapeBuilder)?;

    assert_eq!(imported.meshes.len(), 1);
    assert_eq!(imported.meshes[0].material(), &Material::default());
    assert!(imported.textures.is_empty());
    Ok(())
}

const TRIANGLE_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "buffers": [{ "uri": "tri.bin", "byteLength": 108 }],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 72, "byteLength": 24 },
        { "buffer": 0, "byteOffset": 96, "byteLength": 12 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
        { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
        { "bufferView": 3, "componentType": 5125, "count": 3, "type": "SCALAR" }
    ],
    "images": [{ "uri": "normal.png" }],
    "textures": [{ "source": 0 }],
    "materials": [{
        "name": "rough",
        "pbrMetallicRoughness": { "baseColorFactor": [1, 0, 0, 1], "roughnessFactor": 0.5 },
        "normalTexture": { "index": 0, "scale": 0.5 }
    }],
    "meshes": [{
        "name": "Tri",
        "primitives": [{
            "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 },
            "indices": 3,
            "material": 0
        }]
    }]
}"#;

fn triangle_bin() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let normals: [f32; 9] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    let uvs: [f32; 6] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0];
    let indices: [u32; 3] = [0, 1, 2];
    let mut bin = Vec::with_capacity(108);
    bin.extend_from_slice(bytemuck::cast_slice(&positions));
    bin.extend_from_slice(bytemuck::cast_slice(&normals));
    bin.extend_from_slice(bytemuck::cast_slice(&uvs));
    bin.extend_from_slice(bytemuck::cast_slice(&indices));
    bin
}

#[test]
fn should_import_gltf_with_external_buffer() -> anyhow::Result<()> {
    let bin = triangle_bin();
    let raw = RawScene::from_gltf_slice(TRIANGLE_GLTF.as_bytes(), "tri.gltf", |uri| {
        assert_eq!(uri, "tri.bin");
        Ok(bin.clone())
    })?;

    assert_eq!(raw.meshes.len(), 1);
    assert_eq!(raw.meshes[0].name, "Tri");
    assert_eq!(raw.meshes[0].faces, vec![vec![0, 1, 2]]);

    let imported = import_scene(&raw, "models/", &ShapeRequest::None, &ParryShapeBuilder)?;
    let material = imported.meshes[0].material();
    assert_eq!(material.normal_map.as_deref(), Some("models/normal.png"));
    assert_eq!(material.diffuse_map, None);
    assert_close(material.displacement_factor, 0.5);
    assert_close(material.shininess, 64.0);
    assert!(material.diffuse_color.compare(&Color::rgb(1.0, 0.0, 0.0)));
    Ok(())
}

#[test]
fn should_report_missing_gltf_buffers() {
    let result = RawScene::from_gltf_slice(TRIANGLE_GLTF.as_bytes(), "tri.gltf", |uri| {
        Err(EngineError::msg(format!("{uri} not found")))
    });
    let err = result.expect_err("buffer is missing");
    assert!(err.to_string().contains("tri.bin"));
    assert!(std::error::Error::source(&err).is_some());
}
