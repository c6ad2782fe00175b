//! Scene graph and hierarchical scene organization.
//!
//! Nodes carry a transform relative to their parent. After
//! [`SceneNode::update_world_transforms`] every node also knows its world
//! matrix, `parent_world * local`, which is what the renderers consume.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::{model::Model, transform::Transform},
    error::Result,
    render::EntityDraw,
    resources::{
        collision::{CollisionShapeBuilder, ShapeRequest},
        database::AssetDatabase,
        load_model,
    },
};

/// State shared by all node kinds.
pub struct NodeCore {
    pub local: Transform,
    world: Matrix4<f32>,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl NodeCore {
    pub fn new(local: Transform) -> Self {
        Self {
            local,
            world: Matrix4::identity(),
            children: Vec::new(),
        }
    }
}

impl Default for NodeCore {
    fn default() -> Self {
        Self::new(Transform::default())
    }
}

pub trait SceneNode {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// Draws contributed by this node alone, children excluded.
    fn own_render(&self) -> Option<EntityDraw<'_>> {
        None
    }

    fn local_transform(&self) -> &Transform {
        &self.core().local
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.core_mut().local = transform;
    }

    fn world_transform(&self) -> Matrix4<f32> {
        self.core().world
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.core().children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.core_mut().children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.core_mut().children.push(child);
    }

    /// Recompute the world matrix of this node and its subtree.
    fn update_world_transforms(&mut self, parent: &Matrix4<f32>) {
        let core = self.core_mut();
        core.world = *parent * core.local.to_matrix();
        let world = core.world;
        for child in core.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    /// Treat this node as a root and update the whole subtree.
    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Matrix4::identity());
    }

    /// Everything this subtree wants to draw with the entity program.
    fn get_render(&self) -> Vec<EntityDraw<'_>> {
        self.children()
            .iter()
            .flat_map(|child| child.get_render())
            .chain(self.own_render())
            .collect()
    }
}

/// A node without geometry that groups its children.
#[derive(Default)]
pub struct ContainerNode {
    core: NodeCore,
}

impl ContainerNode {
    pub fn new(local: Transform) -> Self {
        Self {
            core: NodeCore::new(local),
        }
    }

    pub fn with_children(local: Transform, children: Vec<Box<dyn SceneNode>>) -> Self {
        let mut node = Self::new(local);
        node.core.children = children;
        node
    }
}

impl SceneNode for ContainerNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
}

/// A node drawing a [`Model`]. Models are shared so several nodes can
/// place the same geometry.
pub struct ModelNode {
    core: NodeCore,
    model: Arc<Model>,
}

impl ModelNode {
    pub fn new(model: Arc<Model>, local: Transform) -> Self {
        Self {
            core: NodeCore::new(local),
            model,
        }
    }

    /// Load `file_name` and wrap it into a node with an identity transform.
    pub async fn load(
        file_name: &str,
        shape: &ShapeRequest,
        builder: &dyn CollisionShapeBuilder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        db: &mut AssetDatabase,
    ) -> Result<Self> {
        let model = load_model(file_name, shape, builder, device, queue, db).await?;
        Ok(Self::new(Arc::new(model), Transform::default()))
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }
}

impl SceneNode for ModelNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn own_render(&self) -> Option<EntityDraw<'_>> {
        Some(EntityDraw {
            model: &self.model,
            world: self.core.world,
        })
    }
}
