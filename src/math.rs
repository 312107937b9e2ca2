use glam::{Vec2, Vec3};

use crate::backend::{Light, Rgba};

/// Edge function used in rasterization
pub fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Barycentric weights of `p` in triangle `abc`, or `None` if `p` lies outside
/// or the triangle is degenerate. Works for either winding.
pub fn barycentric(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> Option<Vec3> {
    let area = edge_function(a, b, c);
    if area.abs() <= f32::EPSILON {
        return None;
    }
    let w0 = edge_function(b, c, p) / area;
    let w1 = edge_function(c, a, p) / area;
    let w2 = edge_function(a, b, p) / area;
    (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0).then_some(Vec3::new(w0, w1, w2))
}

/// Calculates the normal vector of a triangle (zero for degenerate triangles)
pub fn calculate_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Calculates the light intensity for a surface normal under directional lights
pub fn calculate_light_intensity(normal: Vec3, ambient: f32, lights: &[Light]) -> f32 {
    let diffuse: f32 = lights
        .iter()
        .map(|light| light.diffuse * normal.dot(light.direction).max(0.0))
        .sum();
    (ambient + diffuse).clamp(0.0, 1.0)
}

/// Applies lighting to a color, keeping its alpha
pub fn apply_lighting(color: Rgba, intensity: f32) -> Rgba {
    let scale = |c: u8| (c as f32 * intensity).min(255.0) as u8;
    Rgba(scale(color.0), scale(color.1), scale(color.2), color.3)
}

/// Separating-axis test between a triangle and an axis-aligned rectangle
pub fn triangle_overlaps_rect(tri: [Vec2; 3], min: Vec2, max: Vec2) -> bool {
    let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
    let mut axes = vec![Vec2::X, Vec2::Y];
    for i in 0..3 {
        let edge = tri[(i + 1) % 3] - tri[i];
        axes.push(edge.perp());
    }
    axes.iter().all(|&axis| intervals_overlap(axis, &tri, &corners))
}

/// Separating-axis test between a segment and an axis-aligned rectangle
pub fn segment_overlaps_rect(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> bool {
    let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
    let axes = [Vec2::X, Vec2::Y, (b - a).perp()];
    axes.iter().all(|&axis| intervals_overlap(axis, &[a, b], &corners))
}

/// Liang-Barsky: parameter range `(t0, t1)` of `a + t·(b − a)` inside the rectangle
pub fn clip_segment_to_rect(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> Option<(f32, f32)> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

fn intervals_overlap(axis: Vec2, shape: &[Vec2], rect: &[Vec2; 4]) -> bool {
    if axis.length_squared() <= f32::EPSILON {
        return true;
    }
    let (s_min, s_max) = project_onto(axis, shape);
    let (r_min, r_max) = project_onto(axis, rect);
    s_min <= r_max && r_min <= s_max
}

fn project_onto(axis: Vec2, points: &[Vec2]) -> (f32, f32) {
    points
        .iter()
        .map(|p| p.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}
