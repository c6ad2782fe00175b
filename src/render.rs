//! Render composition and program batching.
//!
//! Callers describe a frame with the [`Render`] enum. The renderer flattens
//! it into [`Batches`], one list per shader program, and draws the lists in
//! a fixed order: entities, water, GUI.

use cgmath::Matrix4;

use crate::{
    data_structures::{model::Model, scene_graph::SceneNode},
    renderable::{gui::GuiPane, water::Water},
};

/// A model placed in the world.
#[derive(Clone, Copy)]
pub struct EntityDraw<'a> {
    pub model: &'a Model,
    pub world: Matrix4<f32>,
}

/// What to draw in a frame.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Entity` / `Entities` render models with the entity program
/// - `Water` renders a water surface, and triggers its captures
/// - `Gui` renders a pane and all of its descendants
/// - `Composed` renders all contained renders
pub enum Render<'a> {
    None,
    Entity(EntityDraw<'a>),
    Entities(Vec<EntityDraw<'a>>),
    Water(&'a Water),
    Gui(&'a GuiPane),
    Composed(Vec<Render<'a>>),
}

/// Draws of one frame, grouped by program.
#[derive(Default)]
pub struct Batches<'a> {
    pub entities: Vec<EntityDraw<'a>>,
    pub waters: Vec<&'a Water>,
    pub guis: Vec<&'a GuiPane>,
}

impl<'a> Render<'a> {
    pub fn into_batches(self) -> Batches<'a> {
        let mut batches = Batches::default();
        self.collect(&mut batches);
        batches
    }

    fn collect(self, batches: &mut Batches<'a>) {
        match self {
            Render::None => (),
            Render::Entity(draw) => batches.entities.push(draw),
            Render::Entities(mut draws) => batches.entities.append(&mut draws),
            Render::Water(water) => batches.waters.push(water),
            Render::Gui(pane) => batches.guis.extend(pane.flatten()),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.collect(batches)),
        }
    }
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(node: &'a dyn SceneNode) -> Self {
        Render::Entities(node.get_render())
    }
}

impl<'a> From<&'a Water> for Render<'a> {
    fn from(water: &'a Water) -> Self {
        Render::Water(water)
    }
}

impl<'a> From<&'a GuiPane> for Render<'a> {
    fn from(pane: &'a GuiPane) -> Self {
        Render::Gui(pane)
    }
}
