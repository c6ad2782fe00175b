//! Hierarchical GUI panes.
//!
//! A [`GuiPane`] is a textured, colored quad positioned relative to its
//! parent. Panes carry a unique pick id; the picking pass renders these ids
//! and [`GuiPane::is_mouse_over`] compares them with the id under the cursor.

use std::sync::atomic::{AtomicU32, Ordering};

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{
    camera::Camera,
    data_structures::{
        color::Color,
        transform::{Transform, matrix_to_array},
    },
    resources::database::TEXTURE_BLACK,
};

// Zero is the clear value of the pick target and means "nothing".
static NEXT_PICK_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuiText {
    pub text: String,
    pub line_width: f32,
}

#[derive(Debug)]
pub struct GuiPane {
    transform: Transform,
    parent_world: Matrix4<f32>,
    world: Matrix4<f32>,
    parent_scale: Vector3<f32>,
    pub color: Color,
    pub texture: String,
    pick_id: u32,
    text: GuiText,
    render_text: bool,
    facing_camera: bool,
    children: Vec<GuiPane>,
}

impl GuiPane {
    pub fn new() -> Self {
        Self {
            transform: Transform::default(),
            parent_world: Matrix4::identity(),
            world: Matrix4::identity(),
            parent_scale: Vector3::new(1.0, 1.0, 1.0),
            color: Color::WHITE,
            texture: TEXTURE_BLACK.to_string(),
            pick_id: NEXT_PICK_ID.fetch_add(1, Ordering::Relaxed),
            text: GuiText::default(),
            render_text: false,
            facing_camera: false,
            children: Vec::new(),
        }
    }

    /// Attach `child` below this pane and return it.
    pub fn add_child(&mut self, mut child: GuiPane) -> &mut GuiPane {
        child.update_transforms(&self.world, self.global_scale());
        let idx = self.children.len();
        self.children.push(child);
        &mut self.children[idx]
    }

    pub fn children(&self) -> &[GuiPane] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [GuiPane] {
        &mut self.children
    }

    /// Recompute world matrices and global scales of this subtree.
    pub fn update_transforms(&mut self, parent_world: &Matrix4<f32>, parent_scale: Vector3<f32>) {
        self.parent_world = *parent_world;
        self.parent_scale = parent_scale;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.world = self.parent_world * self.transform.to_matrix();
        let (world, scale) = (self.world, self.global_scale());
        for child in &mut self.children {
            child.update_transforms(&world, scale);
        }
    }

    /// Scale including all parents.
    pub fn global_scale(&self) -> Vector3<f32> {
        let s = self.transform.scale;
        Vector3::new(
            self.parent_scale.x * s.x,
            self.parent_scale.y * s.y,
            self.parent_scale.z * s.z,
        )
    }

    /// Sets the width and lets the text wrap at the new width.
    pub fn set_scale_x(&mut self, scale_x: f32) {
        self.transform.scale.x = scale_x;
        self.text.line_width = self.global_scale().x * 2.0;
        self.refresh();
    }

    pub fn set_scale_y(&mut self, scale_y: f32) {
        self.transform.scale.y = scale_y;
        self.refresh();
    }

    pub fn scale_x(&self) -> f32 {
        self.transform.scale.x
    }

    pub fn scale_y(&self) -> f32 {
        self.transform.scale.y
    }

    pub fn scale_z(&self) -> f32 {
        self.transform.scale.z
    }

    pub fn set_pos_x(&mut self, x: f32) {
        self.transform.position.x = x;
        self.refresh();
    }

    pub fn set_pos_y(&mut self, y: f32) {
        self.transform.position.y = y;
        self.refresh();
    }

    pub fn set_pos_z(&mut self, z: f32) {
        self.transform.position.z = z;
        self.refresh();
    }

    pub fn pos_x(&self) -> f32 {
        self.transform.position.x
    }

    pub fn pos_y(&self) -> f32 {
        self.transform.position.y
    }

    pub fn pos_z(&self) -> f32 {
        self.transform.position.z
    }

    pub fn set_rot_x(&mut self, x: f32) {
        self.transform.rotation.x = x;
        self.refresh();
    }

    pub fn set_rot_y(&mut self, y: f32) {
        self.transform.rotation.y = y;
        self.refresh();
    }

    pub fn set_rot_z(&mut self, z: f32) {
        self.transform.rotation.z = z;
        self.refresh();
    }

    pub fn rot_x(&self) -> f32 {
        self.transform.rotation.x
    }

    pub fn rot_y(&self) -> f32 {
        self.transform.rotation.y
    }

    pub fn rot_z(&self) -> f32 {
        self.transform.rotation.z
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World matrix as 16 column-major floats.
    pub fn trans_mat(&self) -> [f32; 16] {
        matrix_to_array(&self.world)
    }

    /// Billboard matrix: faces `camera`, placed at the pane position.
    pub fn trans_mat_facing(&self, camera: &Camera) -> [f32; 16] {
        let mut m = matrix_to_array(&camera.facing_matrix());
        m[12] = self.pos_x();
        m[13] = self.pos_y();
        m[14] = self.pos_z();
        m[15] = 1.0;
        m
    }

    /// The matrix the GUI program should use for this pane.
    pub fn render_matrix(&self, camera: &Camera) -> [f32; 16] {
        if self.facing_camera {
            self.trans_mat_facing(camera)
        } else {
            self.trans_mat()
        }
    }

    pub fn pick_id(&self) -> u32 {
        self.pick_id
    }

    /// `picked` is the id read back by the last picking pass.
    pub fn is_mouse_over(&self, picked: Option<u32>) -> bool {
        picked == Some(self.pick_id)
    }

    pub fn text(&self) -> &GuiText {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text.text = text.into();
    }

    pub fn enable_text(&mut self) {
        self.render_text = true;
    }

    pub fn disable_text(&mut self) {
        self.render_text = false;
    }

    pub fn renders_text(&self) -> bool {
        self.render_text
    }

    pub fn set_facing_camera(&mut self, facing: bool) {
        self.facing_camera = facing;
    }

    pub fn is_facing_camera(&self) -> bool {
        self.facing_camera
    }

    /// This pane followed by all descendants, parents before children.
    pub fn flatten(&self) -> Vec<&GuiPane> {
        let mut panes = vec![self];
        for child in &self.children {
            panes.extend(child.flatten());
        }
        panes
    }
}

impl Default for GuiPane {
    fn default() -> Self {
        Self::new()
    }
}
