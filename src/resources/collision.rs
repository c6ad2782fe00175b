//! Collision shapes derived from imported mesh data.
//!
//! The physics engine itself is an external collaborator: the importer only
//! asks a [`CollisionShapeBuilder`] for a shape built from flat vertex and
//! index arrays. [`ParryShapeBuilder`] is the default implementation backed by
//! `parry3d`.

use parry3d::{
    math::{Point, Real},
    shape::SharedShape,
};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Constructs collision shapes from `(x0, y0, z0, x1, ...)` vertex data.
pub trait CollisionShapeBuilder {
    fn convex_hull(&self, vertices: &[f32]) -> Result<SharedShape>;

    fn triangle_mesh(&self, vertices: &[f32], indices: &[u32]) -> Result<SharedShape>;
}

/// What collision shape an imported mesh should get.
#[derive(Clone, Default)]
pub enum ShapeRequest {
    /// The mesh has no collision shape.
    #[default]
    None,
    /// Convex hull around all vertices.
    ConvexHull,
    /// Exact triangle mesh built from vertices and indices.
    TriangleMesh,
    /// Use the given shape as is.
    Fixed(SharedShape),
}

impl ShapeRequest {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeRequest::None => ShapeKind::None,
            ShapeRequest::ConvexHull => ShapeKind::ConvexHull,
            ShapeRequest::TriangleMesh => ShapeKind::TriangleMesh,
            ShapeRequest::Fixed(_) => ShapeKind::Fixed,
        }
    }

    /// Resolve the request against the mesh data.
    pub fn build(
        &self,
        vertices: &[f32],
        indices: &[u32],
        builder: &dyn CollisionShapeBuilder,
    ) -> Result<Option<SharedShape>> {
        match self {
            ShapeRequest::None => Ok(None),
            ShapeRequest::ConvexHull => builder.convex_hull(vertices).map(Some),
            ShapeRequest::TriangleMesh => builder.triangle_mesh(vertices, indices).map(Some),
            ShapeRequest::Fixed(shape) => Ok(Some(shape.clone())),
        }
    }
}

impl std::fmt::Debug for ShapeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeRequest::Fixed(shape) => f
                .debug_tuple("Fixed")
                .field(&shape.shape_type())
                .finish(),
            other => write!(f, "{:?}", other.kind()),
        }
    }
}

/// Serializable tag of a [`ShapeRequest`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    None,
    ConvexHull,
    TriangleMesh,
    Fixed,
}

/// Distance and area below which geometry counts as degenerate.
const DEGENERATE_EPSILON: Real = 1.0e-6;

#[derive(Clone, Copy, Debug, Default)]
pub struct ParryShapeBuilder;

impl CollisionShapeBuilder for ParryShapeBuilder {
    fn convex_hull(&self, vertices: &[f32]) -> Result<SharedShape> {
        let points = to_points(vertices)?;
        if points.len() < 4 {
            return Err(EngineError::collision(format!(
                "a convex hull needs at least 4 points, got {}",
                points.len()
            )));
        }
        if is_flat(&points) {
            return Err(EngineError::collision(
                "all vertices lie in one plane, no convex hull exists",
            ));
        }
        SharedShape::convex_hull(&points)
            .ok_or_else(|| EngineError::collision("vertices are degenerate, no convex hull exists"))
    }

    fn triangle_mesh(&self, vertices: &[f32], indices: &[u32]) -> Result<SharedShape> {
        let points = to_points(vertices)?;
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(EngineError::collision(format!(
                "triangle mesh needs a non-empty multiple of 3 indices, got {}",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= points.len()) {
            return Err(EngineError::collision(format!(
                "index {bad} is out of range for {} vertices",
                points.len()
            )));
        }
        let triangles = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();
        let has_area = triangles.iter().any(|[a, b, c]| {
            let (a, b, c) = (points[*a as usize], points[*b as usize], points[*c as usize]);
            (b - a).cross(&(c - a)).norm() > DEGENERATE_EPSILON
        });
        if !has_area {
            return Err(EngineError::collision(format!(
                "all {} triangles have zero area",
                triangles.len()
            )));
        }
        SharedShape::trimesh(points, triangles).map_err(|e| EngineError::Collision {
            message: "triangle mesh was rejected".to_string(),
            cause: Some(Box::new(e)),
        })
    }
}

/// True when the points span no volume: all collinear or all in one plane.
fn is_flat(points: &[Point<Real>]) -> bool {
    let origin = points[0];
    let Some(edge) = points
        .iter()
        .map(|p| p - origin)
        .find(|d| d.norm() > DEGENERATE_EPSILON)
    else {
        return true;
    };
    let Some(normal) = points
        .iter()
        .map(|p| edge.cross(&(p - origin)))
        .find(|n| n.norm() > DEGENERATE_EPSILON)
    else {
        return true;
    };
    let normal = normal.normalize();
    points
        .iter()
        .all(|p| normal.dot(&(p - origin)).abs() <= DEGENERATE_EPSILON)
}

fn to_points(vertices: &[f32]) -> Result<Vec<Point<Real>>> {
    if vertices.len() % 3 != 0 {
        return Err(EngineError::collision(format!(
            "vertex data length {} is not a multiple of 3",
            vertices.len()
        )));
    }
    Ok(vertices
        .chunks_exact(3)
        .map(|v| Point::new(v[0], v[1], v[2]))
        .collect())
}
