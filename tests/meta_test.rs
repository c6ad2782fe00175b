mod common;

use common::{CountingBuilder, cube_mesh, quad_mesh};
use core_ngin::{
    data_structures::material::Material,
    error::EngineError,
    resources::{
        collision::{ParryShapeBuilder, ShapeKind, ShapeRequest},
        mesh::{MeshData, parse_mesh},
        meta::MetaMesh,
    },
};
use parry3d::shape::{Ball, SharedShape};

#[test]
fn should_restore_mesh_from_json() -> anyhow::Result<()> {
    let material = Material {
        diffuse_map: Some("models/wood.png".into()),
        shininess: 16.0,
        ..Default::default()
    };
    let mut raw = quad_mesh("quad");
    raw.material_index = Some(0);
    let mesh = parse_mesh(&raw, &[material], &ShapeRequest::None, &ParryShapeBuilder)?;

    let json = mesh.meta().to_json()?;
    let meta = MetaMesh::from_json(&json)?;
    assert_eq!(meta, mesh.meta());

    let restored = MeshData::from_meta(meta, &ParryShapeBuilder)?;
    assert_eq!(restored.name(), "quad");
    assert_eq!(restored.vertices(), mesh.vertices());
    assert_eq!(restored.tangents(), mesh.tangents());
    assert_eq!(restored.indices(), mesh.indices());
    assert_eq!(restored.material(), mesh.material());
    assert!(restored.shape().is_none());
    Ok(())
}

#[test]
fn should_rebuild_collision_shape_from_kind() -> anyhow::Result<()> {
    let mesh = parse_mesh(&cube_mesh("cube"), &[], &ShapeRequest::ConvexHull, &ParryShapeBuilder)?;
    let meta = MetaMesh::from_json(&mesh.meta().to_json()?)?;
    assert_eq!(meta.shape, ShapeKind::ConvexHull);

    let builder = CountingBuilder::default();
    let restored = MeshData::from_meta(meta, &builder)?;
    assert_eq!(restored.shape_kind(), ShapeKind::ConvexHull);
    assert!(restored.shape().is_some());
    assert_eq!(builder.hulls.get(), 1);
    Ok(())
}

#[test]
fn should_drop_fixed_shapes_on_restore() -> anyhow::Result<()> {
    let request = ShapeRequest::Fixed(SharedShape::new(Ball::new(1.0)));
    let mesh = parse_mesh(&quad_mesh("quad"), &[], &request, &ParryShapeBuilder)?;
    assert_eq!(mesh.meta().shape, ShapeKind::Fixed);

    let restored = MeshData::from_meta(mesh.meta(), &ParryShapeBuilder)?;
    assert!(restored.shape().is_none());
    assert_eq!(restored.shape_kind(), ShapeKind::None);
    Ok(())
}

#[test]
fn should_default_missing_shape_kind() -> anyhow::Result<()> {
    let mesh = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::None, &ParryShapeBuilder)?;
    let mut value: serde_json::Value = serde_json::from_str(&mesh.meta().to_json()?)?;
    value
        .as_object_mut()
        .expect("meta is an object")
        .remove("shape");

    let meta = MetaMesh::from_json(&value.to_string())?;
    assert_eq!(meta.shape, ShapeKind::None);
    Ok(())
}

#[test]
fn should_reject_inconsistent_meta() -> anyhow::Result<()> {
    let mesh = parse_mesh(&quad_mesh("quad"), &[], &ShapeRequest::None, &ParryShapeBuilder)?;

    let mut meta = mesh.meta();
    meta.normals.pop();
    assert!(MeshData::from_meta(meta, &ParryShapeBuilder).is_err());

    let mut meta = mesh.meta();
    meta.indices[0] = 99;
    assert!(MeshData::from_meta(meta, &ParryShapeBuilder).is_err());
    Ok(())
}

#[test]
fn should_report_malformed_json_as_serialization_error() {
    let result = MetaMesh::from_json("{ \"name\": 3 }");
    assert!(matches!(result, Err(EngineError::Serialization(_))));
}
