use glam::Vec2;

use crate::backend::Rgba;
use crate::math::{clip_segment_to_rect, edge_function};
use crate::vertex::ScreenVertex;

/// RGBA colour buffer with a matching depth buffer
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes, row-major from the top-left corner
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * 4;
        let p = &self.pixels[offset..offset + 4];
        Some(Rgba(p[0], p[1], p[2], p[3]))
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    /// Fill colour and reset depth to the far plane
    pub fn clear(&mut self, color: Rgba) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[color.0, color.1, color.2, color.3]);
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Depth-tested write; blends by source alpha when `blend` is set
    fn plot(&mut self, x: usize, y: usize, depth: f32, color: Rgba, blend: bool) {
        let offset = y * self.width + x;
        if depth >= self.depth[offset] {
            return;
        }
        self.depth[offset] = depth;

        let pixel = &mut self.pixels[offset * 4..offset * 4 + 4];
        if blend {
            let alpha = color.3 as f32 / 255.0;
            let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)) as u8;
            pixel[0] = mix(color.0, pixel[0]);
            pixel[1] = mix(color.1, pixel[1]);
            pixel[2] = mix(color.2, pixel[2]);
        } else {
            pixel.copy_from_slice(&[color.0, color.1, color.2, color.3]);
        }
    }
}

/// Draws a flat-coloured triangle with depth testing
pub fn draw_triangle(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    v2: &ScreenVertex,
    framebuffer: &mut Framebuffer,
    color: Rgba,
    blend: bool,
) {
    if framebuffer.width == 0 || framebuffer.height == 0 {
        return;
    }
    let (p0, p1, p2) = (v0.screen_position, v1.screen_position, v2.screen_position);

    // Compute bounding box of the triangle
    let max_x = framebuffer.width as f32 - 1.0;
    let max_y = framebuffer.height as f32 - 1.0;
    let min = p0.min(p1).min(p2).floor().max(Vec2::ZERO);
    let max = p0.max(p1).max(p2).ceil().min(Vec2::new(max_x, max_y));
    if min.x > max.x || min.y > max.y {
        return;
    }

    // Precompute area of the triangle
    let area = edge_function(p0, p1, p2);
    if area.abs() <= f32::EPSILON {
        return;
    }

    // For each pixel in the bounding box
    for y in min.y as usize..=max.y as usize {
        for x in min.x as usize..=max.x as usize {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

            // Normalized barycentric coordinates; the sign of `area` absorbs winding
            let w0 = edge_function(p1, p2, p) / area;
            let w1 = edge_function(p2, p0, p) / area;
            let w2 = edge_function(p0, p1, p) / area;

            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                let depth = v0.depth * w0 + v1.depth * w1 + v2.depth * w2;
                framebuffer.plot(x, y, depth, color, blend);
            }
        }
    }
}

/// Draws a depth-tested line using Bresenham's algorithm
pub fn draw_line(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    framebuffer: &mut Framebuffer,
    color: Rgba,
    blend: bool,
) {
    if framebuffer.width == 0 || framebuffer.height == 0 {
        return;
    }

    // Trim to the buffer first so far off-screen endpoints cost nothing
    let (p0, p1) = (v0.screen_position, v1.screen_position);
    let max = Vec2::new(framebuffer.width as f32 - 0.5, framebuffer.height as f32 - 0.5);
    let Some((t0, t1)) = clip_segment_to_rect(p0, p1, Vec2::splat(-0.5), max) else {
        return;
    };
    let (start, end) = (p0.lerp(p1, t0), p0.lerp(p1, t1));
    let depth_at = |t: f32| v0.depth + (v1.depth - v0.depth) * t;
    let (depth0, depth1) = (depth_at(t0), depth_at(t1));

    let (mut x0, mut y0, x1, y1) = (
        start.x.round() as isize,
        start.y.round() as isize,
        end.x.round() as isize,
        end.y.round() as isize,
    );
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy; // error value e_xy

    let steps = dx.max(-dy).max(1) as f32;
    let mut step = 0.0;

    loop {
        if x0 >= 0 && x0 < framebuffer.width as isize && y0 >= 0 && y0 < framebuffer.height as isize
        {
            let t = step / steps;
            let depth = depth0 + (depth1 - depth0) * t;
            framebuffer.plot(x0 as usize, y0 as usize, depth, color, blend);
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
        step += 1.0;
    }
}
