//! Objects with their own shader program: water, sun and moon, GUI panes.

pub mod gui;
pub mod sun;
pub mod water;
