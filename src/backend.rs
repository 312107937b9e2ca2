//! Graphics backend capability
//!
//! The viewport never talks to a GPU API directly. Everything it needs from a
//! renderer is expressed by [`GraphicsBackend`]: a viewport, a projection
//! matrix plus a modelview matrix stack, immediate-mode line and triangle
//! submission, lighting/blending switches, and a named-object selection mode
//! that reports hit records.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);

    /// Same colour with a different alpha
    pub fn with_alpha(self, alpha: u8) -> Self {
        Rgba(self.0, self.1, self.2, alpha)
    }
}

/// Directional light. `direction` points from the scene towards the light and
/// is interpreted in the modelview space current when lighting is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub direction: Vec3,
    pub diffuse: f32,
}

/// One entry of a selection pass: the name that was on top of the name stack
/// while something was drawn inside the pick window, and the depth range it
/// covered (0 = near plane, `u32::MAX` = far plane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRecord {
    pub name: u32,
    pub min_depth: u32,
    pub max_depth: u32,
}

/// Identification strings reported by the backend, consumed once by the capability probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendInfo {
    pub version: String,
    pub renderer: String,
    pub extensions: String,
}

/// Renderer consumed by the viewport.
///
/// Frame and selection passes are never interleaved: a caller brackets a frame
/// with `begin_frame`/`present` and a pick with `begin_select`/`end_select`,
/// and does not start one while the other is open.
pub trait GraphicsBackend {
    fn info(&self) -> BackendInfo;

    /// Current viewport size in pixels
    fn viewport_size(&self) -> (u32, u32);

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Make the surface current and clear colour and depth
    fn begin_frame(&mut self, clear: Rgba) -> Result<(), BackendError>;

    /// Finish the frame (swap buffers)
    fn present(&mut self) -> Result<(), BackendError>;

    /// Close an open frame without presenting it
    fn discard_frame(&mut self);

    fn set_projection(&mut self, projection: Mat4);

    fn projection(&self) -> Mat4;

    /// Replace the top of the modelview stack
    fn load_modelview(&mut self, matrix: Mat4);

    /// Post-multiply the top of the modelview stack
    fn mult_modelview(&mut self, matrix: Mat4);

    fn push_matrix(&mut self);

    fn pop_matrix(&mut self);

    fn set_lighting(&mut self, ambient: f32, lights: &[Light]);

    fn set_blending(&mut self, enabled: bool);

    fn set_color(&mut self, color: Rgba);

    fn draw_lines(&mut self, segments: &[[Vec3; 2]]);

    fn draw_triangles(&mut self, triangles: &[[Vec3; 3]]);

    /// Switch into selection recording; nothing is drawn until `end_select`
    fn begin_select(&mut self) -> Result<(), BackendError>;

    fn push_name(&mut self, name: u32);

    fn pop_name(&mut self);

    /// Leave selection mode and return the hit records in the order they were closed
    fn end_select(&mut self) -> Result<Vec<HitRecord>, BackendError>;
}
