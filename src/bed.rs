use glam::{Mat4, Vec3};

use crate::backend::{GraphicsBackend, Rgba};
use crate::config::PrintVolume;

/// Grid cells along each floor axis
pub const GRID_DIVISIONS: usize = 20;
pub const BASE_PLATE_ALPHA: u8 = 130;
/// Base plate sits just below the floor so grid lines stay visible
pub const BASE_PLATE_OFFSET: f32 = -0.04;

/// Build-volume outline, floor grid and base plate, in bed space with the
/// origin at the front-left floor corner
#[derive(Debug, Clone, PartialEq)]
pub struct BedGeometry {
    pub lines: Vec<[Vec3; 2]>,
    /// Base plate triangles with the dump area cut out
    pub plate: Vec<[Vec3; 3]>,
}

impl BedGeometry {
    pub fn new(volume: &PrintVolume) -> Self {
        let mut lines = Vec::new();
        outline(volume, &mut lines);
        dump_area_outline(volume, &mut lines);
        grid(volume, &mut lines);
        lines.retain(|[a, b]| a != b);

        let plate = plate_quads(volume)
            .into_iter()
            .flat_map(|[a, b, c, d]| [[a, b, c], [a, c, d]])
            .collect();

        Self { lines, plate }
    }

    /// Outline and grid, unlit
    pub fn draw_lines(&self, backend: &mut dyn GraphicsBackend, color: Rgba) {
        backend.set_color(color);
        backend.draw_lines(&self.lines);
    }

    /// Translucent plate; draw after the models
    pub fn draw_plate(&self, backend: &mut dyn GraphicsBackend, color: Rgba) {
        backend.push_matrix();
        backend.mult_modelview(Mat4::from_translation(Vec3::new(0.0, 0.0, BASE_PLATE_OFFSET)));
        backend.set_blending(true);
        backend.set_color(color.with_alpha(BASE_PLATE_ALPHA));
        backend.draw_triangles(&self.plate);
        backend.set_blending(false);
        backend.pop_matrix();
    }
}

/// Bounds of the dump area as (x1, x2, y1, y2)
fn dump_bounds(volume: &PrintVolume) -> Option<(f32, f32, f32, f32)> {
    volume
        .dump_area
        .map(|d| (d.left, d.left + d.width, d.front, d.front + d.depth))
}

/// Vertical edges and the top rectangle
fn outline(volume: &PrintVolume, lines: &mut Vec<[Vec3; 2]>) {
    let (w, d, h) = (volume.width, volume.depth, volume.height);
    for (x, y) in [(0.0, 0.0), (w, 0.0), (0.0, d), (w, d)] {
        lines.push([Vec3::new(x, y, 0.0), Vec3::new(x, y, h)]);
    }
    let top = [
        Vec3::new(0.0, 0.0, h),
        Vec3::new(w, 0.0, h),
        Vec3::new(w, d, h),
        Vec3::new(0.0, d, h),
    ];
    for i in 0..4 {
        lines.push([top[i], top[(i + 1) % 4]]);
    }
}

fn dump_area_outline(volume: &PrintVolume, lines: &mut Vec<[Vec3; 2]>) {
    let Some((x1, x2, y1, y2)) = dump_bounds(volume) else {
        return;
    };
    // A dump area on the front edge shares it with the volume outline
    if y1 != 0.0 {
        lines.push([Vec3::new(x1, y1, 0.0), Vec3::new(x2, y1, 0.0)]);
    }
    lines.push([Vec3::new(x2, y1, 0.0), Vec3::new(x2, y2, 0.0)]);
    lines.push([Vec3::new(x2, y2, 0.0), Vec3::new(x1, y2, 0.0)]);
    lines.push([Vec3::new(x1, y2, 0.0), Vec3::new(x1, y1, 0.0)]);
}

/// Floor grid, broken where a line crosses the dump area
fn grid(volume: &PrintVolume, lines: &mut Vec<[Vec3; 2]>) {
    let (w, d) = (volume.width, volume.depth);
    let step_x = w / GRID_DIVISIONS as f32;
    let step_y = d / GRID_DIVISIONS as f32;
    let dump = dump_bounds(volume);

    for i in 0..=GRID_DIVISIONS {
        let x = i as f32 * step_x;
        let y = i as f32 * step_y;

        match dump {
            Some((x1, x2, y1, y2)) if y >= y1 && y <= y2 => {
                lines.push([Vec3::new(0.0, y, 0.0), Vec3::new(x1, y, 0.0)]);
                lines.push([Vec3::new(x2, y, 0.0), Vec3::new(w, y, 0.0)]);
            }
            _ => lines.push([Vec3::new(0.0, y, 0.0), Vec3::new(w, y, 0.0)]),
        }

        match dump {
            Some((x1, x2, y1, y2)) if x >= x1 && x <= x2 => {
                lines.push([Vec3::new(x, 0.0, 0.0), Vec3::new(x, y1, 0.0)]);
                lines.push([Vec3::new(x, y2, 0.0), Vec3::new(x, d, 0.0)]);
            }
            _ => lines.push([Vec3::new(x, 0.0, 0.0), Vec3::new(x, d, 0.0)]),
        }
    }
}

fn plate_quads(volume: &PrintVolume) -> Vec<[Vec3; 4]> {
    let (w, d) = (volume.width, volume.depth);
    let quad = |x1: f32, y1: f32, x2: f32, y2: f32| {
        [
            Vec3::new(x1, y1, 0.0),
            Vec3::new(x2, y1, 0.0),
            Vec3::new(x2, y2, 0.0),
            Vec3::new(x1, y2, 0.0),
        ]
    };

    let Some((x1, x2, y1, y2)) = dump_bounds(volume) else {
        return vec![quad(0.0, 0.0, w, d)];
    };

    let mut quads = Vec::new();
    if y1 > 0.0 {
        quads.push(quad(0.0, 0.0, w, y1));
    }
    if y2 < d {
        quads.push(quad(0.0, y2, w, d));
    }
    if x1 > 0.0 {
        quads.push(quad(0.0, y1, x1, y2));
    }
    if x2 < w {
        quads.push(quad(x2, y1, w, y2));
    }
    quads
}
