use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::backend::{BackendInfo, GraphicsBackend, HitRecord, Light, Rgba};
use crate::error::BackendError;
use crate::graphics::{draw_line, draw_triangle, Framebuffer};
use crate::math::{
    apply_lighting, barycentric, calculate_light_intensity, calculate_normal,
    segment_overlaps_rect, triangle_overlaps_rect,
};
use crate::vertex::ScreenVertex;

/// Clip-space w below this is treated as behind the eye
const MIN_CLIP_W: f32 = 1e-5;

/// Name stack and hit list of an open selection pass
#[derive(Debug, Default)]
struct Selection {
    names: Vec<u32>,
    /// Depth range hit since the name stack last changed
    pending: Option<(u32, u32)>,
    hits: Vec<HitRecord>,
}

impl Selection {
    fn record(&mut self, min_depth: u32, max_depth: u32) {
        self.pending = Some(match self.pending {
            Some((lo, hi)) => (lo.min(min_depth), hi.max(max_depth)),
            None => (min_depth, max_depth),
        });
    }

    /// Close the pending hit under the current top name
    fn flush(&mut self) {
        if let (Some((min_depth, max_depth)), Some(&name)) = (self.pending.take(), self.names.last()) {
            self.hits.push(HitRecord {
                name,
                min_depth,
                max_depth,
            });
        }
    }
}

/// CPU backend. Selection mode tests primitives against the pick window,
/// which the pick projection maps onto the whole normalised device square.
#[derive(Debug)]
pub struct SoftwareBackend {
    framebuffer: Framebuffer,
    projection: Mat4,
    /// Modelview stack; the last entry is the current matrix and it is never empty
    modelview: Vec<Mat4>,
    ambient: f32,
    /// Light directions in eye space
    lights: Vec<Light>,
    color: Rgba,
    blending: bool,
    frame_open: bool,
    selection: Option<Selection>,
    frames_presented: u64,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer: Framebuffer::new(width as usize, height as usize),
            projection: Mat4::IDENTITY,
            modelview: vec![Mat4::IDENTITY],
            ambient: 1.0,
            lights: Vec::new(),
            color: Rgba::WHITE,
            blending: false,
            frame_open: false,
            selection: None,
            frames_presented: 0,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn current(&self) -> Mat4 {
        self.modelview.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    fn to_screen(&self, ndc: Vec3) -> ScreenVertex {
        let width = self.framebuffer.width() as f32;
        let height = self.framebuffer.height() as f32;
        ScreenVertex {
            screen_position: Vec2::new(
                (ndc.x + 1.0) * 0.5 * width,
                (1.0 - ndc.y) * 0.5 * height,
            ),
            depth: ndc.z * 0.5 + 0.5,
        }
    }

    fn select_triangle(&mut self, ndc: [Vec3; 3]) {
        let window = (Vec2::splat(-1.0), Vec2::splat(1.0));
        let flat = [ndc[0].truncate(), ndc[1].truncate(), ndc[2].truncate()];
        if !triangle_overlaps_rect(flat, window.0, window.1) || outside_depth_range(&ndc) {
            return;
        }

        // Depth where the triangle covers the window centre, else at its vertices
        let mut depths: Vec<f32> = ndc
            .iter()
            .filter(|v| in_window(v.truncate()))
            .map(|v| v.z)
            .collect();
        if let Some(w) = barycentric(flat[0], flat[1], flat[2], Vec2::ZERO) {
            depths.push(ndc[0].z * w.x + ndc[1].z * w.y + ndc[2].z * w.z);
        }
        if depths.is_empty() {
            depths.extend(ndc.iter().map(|v| v.z));
        }
        self.record_depths(&depths);
    }

    fn select_segment(&mut self, ndc: [Vec3; 2]) {
        let window = (Vec2::splat(-1.0), Vec2::splat(1.0));
        if !segment_overlaps_rect(ndc[0].truncate(), ndc[1].truncate(), window.0, window.1)
            || outside_depth_range(&ndc)
        {
            return;
        }
        self.record_depths(&[ndc[0].z, ndc[1].z]);
    }

    fn record_depths(&mut self, depths: &[f32]) {
        let to_window = |z: f32| ((z.clamp(-1.0, 1.0) as f64 + 1.0) * 0.5 * u32::MAX as f64) as u32;
        let min_depth = depths.iter().copied().fold(f32::INFINITY, f32::min);
        let max_depth = depths.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if let Some(selection) = self.selection.as_mut() {
            selection.record(to_window(min_depth), to_window(max_depth));
        }
    }
}

/// Normalised device coordinates, or `None` behind the eye
fn to_ndc(clip: Vec4) -> Option<Vec3> {
    (clip.w > MIN_CLIP_W).then(|| clip.xyz() / clip.w)
}

/// Signed distance from the near plane in clip space, non-negative on the visible side
fn near_distance(clip: Vec4) -> f32 {
    clip.z + clip.w
}

/// Part of a clip-space segment in front of the near plane
fn clip_segment_near(a: Vec4, b: Vec4) -> Option<[Vec4; 2]> {
    let (da, db) = (near_distance(a), near_distance(b));
    match (da >= 0.0, db >= 0.0) {
        (true, true) => Some([a, b]),
        (false, false) => None,
        (true, false) => Some([a, a.lerp(b, da / (da - db))]),
        (false, true) => Some([b.lerp(a, db / (db - da)), b]),
    }
}

/// Sutherland-Hodgman against the near plane; yields zero, three or four vertices
fn clip_triangle_near(triangle: [Vec4; 3]) -> Vec<Vec4> {
    let mut polygon = Vec::with_capacity(4);
    for i in 0..3 {
        let (current, next) = (triangle[i], triangle[(i + 1) % 3]);
        let (dc, dn) = (near_distance(current), near_distance(next));
        if dc >= 0.0 {
            polygon.push(current);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            polygon.push(current.lerp(next, dc / (dc - dn)));
        }
    }
    polygon
}

fn in_window(p: Vec2) -> bool {
    p.x.abs() <= 1.0 && p.y.abs() <= 1.0
}

fn outside_depth_range(ndc: &[Vec3]) -> bool {
    ndc.iter().all(|v| v.z < -1.0) || ndc.iter().all(|v| v.z > 1.0)
}

impl GraphicsBackend for SoftwareBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            version: "1.5 bedview-software".to_string(),
            renderer: "bedview software rasterizer".to_string(),
            extensions: "GL_ARB_vertex_buffer_object".to_string(),
        }
    }

    fn viewport_size(&self) -> (u32, u32) {
        (
            self.framebuffer.width() as u32,
            self.framebuffer.height() as u32,
        )
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        if self.viewport_size() != (width, height) {
            self.framebuffer.resize(width as usize, height as usize);
        }
    }

    fn begin_frame(&mut self, clear: Rgba) -> Result<(), BackendError> {
        if self.selection.is_some() {
            return Err(BackendError::InvalidState("frame started during selection"));
        }
        let (width, height) = self.viewport_size();
        if width == 0 || height == 0 {
            return Err(BackendError::Unavailable("zero-sized surface".to_string()));
        }
        self.framebuffer.clear(clear);
        self.modelview = vec![Mat4::IDENTITY];
        self.blending = false;
        self.frame_open = true;
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        if !self.frame_open {
            return Err(BackendError::InvalidState("present without an open frame"));
        }
        self.frame_open = false;
        self.frames_presented += 1;
        Ok(())
    }

    fn discard_frame(&mut self) {
        self.frame_open = false;
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn load_modelview(&mut self, matrix: Mat4) {
        if let Some(top) = self.modelview.last_mut() {
            *top = matrix;
        }
    }

    fn mult_modelview(&mut self, matrix: Mat4) {
        if let Some(top) = self.modelview.last_mut() {
            *top *= matrix;
        }
    }

    fn push_matrix(&mut self) {
        let top = self.current();
        self.modelview.push(top);
    }

    fn pop_matrix(&mut self) {
        if self.modelview.len() > 1 {
            self.modelview.pop();
        } else {
            tracing::debug!("Modelview stack underflow ignored");
        }
    }

    fn set_lighting(&mut self, ambient: f32, lights: &[Light]) {
        let modelview = self.current();
        self.ambient = ambient;
        self.lights = lights
            .iter()
            .map(|light| Light {
                direction: modelview.transform_vector3(light.direction).normalize_or_zero(),
                diffuse: light.diffuse,
            })
            .collect();
    }

    fn set_blending(&mut self, enabled: bool) {
        self.blending = enabled;
    }

    fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn draw_lines(&mut self, segments: &[[Vec3; 2]]) {
        let mvp = self.projection * self.current();
        for segment in segments {
            let clip = segment.map(|p| mvp * p.extend(1.0));
            let Some([a, b]) = clip_segment_near(clip[0], clip[1]) else {
                continue;
            };
            let (Some(a), Some(b)) = (to_ndc(a), to_ndc(b)) else {
                continue;
            };
            if self.selection.is_some() {
                self.select_segment([a, b]);
            } else {
                let (a, b) = (self.to_screen(a), self.to_screen(b));
                draw_line(&a, &b, &mut self.framebuffer, self.color, self.blending);
            }
        }
    }

    fn draw_triangles(&mut self, triangles: &[[Vec3; 3]]) {
        let modelview = self.current();
        let mvp = self.projection * modelview;
        for triangle in triangles {
            let polygon: Option<Vec<Vec3>> =
                clip_triangle_near(triangle.map(|p| mvp * p.extend(1.0)))
                    .into_iter()
                    .map(to_ndc)
                    .collect();
            let Some(polygon) = polygon.filter(|polygon| polygon.len() >= 3) else {
                continue;
            };

            if self.selection.is_some() {
                for i in 1..polygon.len() - 1 {
                    self.select_triangle([polygon[0], polygon[i], polygon[i + 1]]);
                }
                continue;
            }

            // Flat shading in eye space, two-sided
            let eye = triangle.map(|p| modelview.transform_point3(p));
            let mut normal = calculate_normal(eye[0], eye[1], eye[2]);
            if normal.dot(-eye[0]) < 0.0 {
                normal = -normal;
            }
            let intensity = calculate_light_intensity(normal, self.ambient, &self.lights);
            let color = apply_lighting(self.color, intensity);

            let screen: Vec<ScreenVertex> = polygon.iter().map(|&v| self.to_screen(v)).collect();
            for i in 1..screen.len() - 1 {
                draw_triangle(
                    &screen[0],
                    &screen[i],
                    &screen[i + 1],
                    &mut self.framebuffer,
                    color,
                    self.blending,
                );
            }
        }
    }

    fn begin_select(&mut self) -> Result<(), BackendError> {
        if self.frame_open || self.selection.is_some() {
            return Err(BackendError::InvalidState("selection started during another pass"));
        }
        self.modelview = vec![Mat4::IDENTITY];
        self.selection = Some(Selection::default());
        Ok(())
    }

    fn push_name(&mut self, name: u32) {
        if let Some(selection) = self.selection.as_mut() {
            selection.flush();
            selection.names.push(name);
        }
    }

    fn pop_name(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.flush();
            selection.names.pop();
        }
    }

    fn end_select(&mut self) -> Result<Vec<HitRecord>, BackendError> {
        let mut selection = self
            .selection
            .take()
            .ok_or(BackendError::InvalidState("no selection in progress"))?;
        selection.flush();
        Ok(selection.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(z: f32, half: f32) -> [[Vec3; 3]; 2] {
        let (a, b, c, d) = (
            Vec3::new(-half, -half, z),
            Vec3::new(half, -half, z),
            Vec3::new(half, half, z),
            Vec3::new(-half, half, z),
        );
        [[a, b, c], [a, c, d]]
    }

    #[test]
    fn test_frame_draws_with_identity_matrices() {
        let mut backend = SoftwareBackend::new(10, 10);
        backend.begin_frame(Rgba::BLACK).unwrap();
        backend.set_color(Rgba(255, 0, 0, 255));
        backend.draw_triangles(&quad(0.0, 0.5));
        backend.present().unwrap();

        let fb = backend.framebuffer();
        assert_eq!(fb.pixel(5, 5), Some(Rgba(255, 0, 0, 255)));
        assert_eq!(fb.pixel(0, 0), Some(Rgba::BLACK));
        assert_eq!(backend.frames_presented(), 1);
    }

    #[test]
    fn test_zero_sized_surface_unavailable() {
        let mut backend = SoftwareBackend::new(0, 0);
        assert!(matches!(
            backend.begin_frame(Rgba::BLACK),
            Err(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn test_passes_do_not_interleave() {
        let mut backend = SoftwareBackend::new(4, 4);
        backend.begin_select().unwrap();
        assert!(backend.begin_frame(Rgba::BLACK).is_err());
        assert!(backend.begin_select().is_err());
        backend.end_select().unwrap();

        backend.begin_frame(Rgba::BLACK).unwrap();
        assert!(backend.begin_select().is_err());
        backend.present().unwrap();
        assert!(backend.end_select().is_err());
    }

    #[test]
    fn test_selection_records_named_hits() {
        let mut backend = SoftwareBackend::new(4, 4);
        backend.begin_select().unwrap();

        backend.push_name(0);
        backend.draw_triangles(&quad(0.5, 2.0));
        backend.pop_name();

        // Off to the side of the window
        backend.push_name(1);
        backend.mult_modelview(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        backend.draw_triangles(&quad(0.0, 1.0));
        backend.pop_name();

        let hits = backend.end_select().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, 0);
        // z = 0.5 lies three quarters of the way to the far plane
        let expected = (0.75 * u32::MAX as f64) as u32;
        assert!(hits[0].min_depth.abs_diff(expected) < 1000);
        // Nothing was rasterised
        assert_eq!(backend.framebuffer().pixel(0, 0), Some(Rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_selection_lines() {
        let mut backend = SoftwareBackend::new(4, 4);
        backend.begin_select().unwrap();
        backend.push_name(7);
        backend.draw_lines(&[[Vec3::new(-3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)]]);
        backend.pop_name();
        let hits = backend.end_select().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, 7);
    }

    #[test]
    fn test_matrix_stack() {
        let mut backend = SoftwareBackend::new(4, 4);
        let t = Mat4::from_translation(Vec3::X);
        backend.load_modelview(t);
        backend.push_matrix();
        backend.mult_modelview(t);
        assert_eq!(backend.current(), t * t);
        backend.pop_matrix();
        assert_eq!(backend.current(), t);
        backend.pop_matrix();
        assert_eq!(backend.current(), t);
    }

    fn perspective_frame() -> SoftwareBackend {
        let mut backend = SoftwareBackend::new(20, 20);
        backend.set_projection(Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 1.0, 100.0));
        backend.begin_frame(Rgba::BLACK).unwrap();
        backend.set_color(Rgba::WHITE);
        backend
    }

    /// Floor triangle running from behind the eye to well in front of it
    const FLOOR_THROUGH_EYE: [Vec3; 3] = [
        Vec3::new(-10.0, -1.0, 10.0),
        Vec3::new(10.0, -1.0, 10.0),
        Vec3::new(0.0, -1.0, -10.0),
    ];

    #[test]
    fn test_segment_through_eye_plane_is_trimmed() {
        let mut backend = perspective_frame();
        backend.draw_lines(&[[Vec3::new(0.0, -0.5, 5.0), Vec3::new(0.0, -0.5, -50.0)]]);
        let fb = backend.framebuffer();
        // Cut at the near plane (row 15) and running towards the horizon
        for y in 11..=15 {
            assert_eq!(fb.pixel(10, y), Some(Rgba::WHITE), "row {y}");
        }
        assert_eq!(fb.pixel(10, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn test_endpoint_close_to_eye_is_trimmed() {
        let mut backend = perspective_frame();
        backend.draw_lines(&[[Vec3::new(100.0, 0.0, -0.0001), Vec3::new(0.0, 0.0, -10.0)]]);
        let fb = backend.framebuffer();
        assert_eq!(fb.pixel(15, 10), Some(Rgba::WHITE));
        assert_eq!(fb.pixel(19, 10), Some(Rgba::WHITE));
        assert_eq!(fb.pixel(5, 10), Some(Rgba::BLACK));
    }

    #[test]
    fn test_triangle_through_eye_plane_is_drawn() {
        let mut backend = perspective_frame();
        backend.draw_triangles(&[FLOOR_THROUGH_EYE]);
        let fb = backend.framebuffer();
        // Below the horizon the floor covers the view
        assert_eq!(fb.pixel(10, 15), Some(Rgba::WHITE));
        assert_eq!(fb.pixel(10, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn test_selection_hits_triangle_through_eye_plane() {
        let mut backend = SoftwareBackend::new(4, 4);
        backend.set_projection(Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 1.0, 100.0));
        backend.begin_select().unwrap();
        backend.push_name(3);
        backend.draw_triangles(&[FLOOR_THROUGH_EYE]);
        backend.pop_name();
        // Entirely behind the eye
        backend.push_name(4);
        backend.mult_modelview(Mat4::from_translation(Vec3::new(0.0, 0.0, 30.0)));
        backend.draw_triangles(&[FLOOR_THROUGH_EYE]);
        backend.pop_name();

        let hits = backend.end_select().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, 3);
    }

    #[test]
    fn test_lighting_shades_faces() {
        let mut backend = SoftwareBackend::new(10, 10);
        backend.begin_frame(Rgba::BLACK).unwrap();
        backend.set_lighting(
            0.25,
            &[Light {
                direction: Vec3::X,
                diffuse: 0.75,
            }],
        );
        backend.set_color(Rgba(200, 200, 200, 255));
        // Facing +z, perpendicular to the light: ambient only
        backend.draw_triangles(&quad(0.0, 0.5));
        assert_eq!(backend.framebuffer().pixel(5, 5), Some(Rgba(50, 50, 50, 255)));
    }
}
