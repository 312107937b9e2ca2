use glam::Vec2;

/// Vertex after projection: pixel position plus window depth in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub screen_position: Vec2,
    pub depth: f32,
}
