use glam::Vec3;

use crate::backend::{GraphicsBackend, Rgba};
use crate::scene::{ModelTransform, SceneModel};

/// Unit cube corners
const VERTICES: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0), // 0
    Vec3::new(1.0, -1.0, -1.0),  // 1
    Vec3::new(1.0, 1.0, -1.0),   // 2
    Vec3::new(-1.0, 1.0, -1.0),  // 3
    Vec3::new(-1.0, -1.0, 1.0),  // 4
    Vec3::new(1.0, -1.0, 1.0),   // 5
    Vec3::new(1.0, 1.0, 1.0),    // 6
    Vec3::new(-1.0, 1.0, 1.0),   // 7
];

/// Each face is defined by 4 vertex indices
const FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [5, 4, 7, 6],
    [4, 0, 3, 7],
    [1, 5, 6, 2],
    [4, 5, 1, 0],
    [3, 2, 6, 7],
];

const FACE_COLORS: [Rgba; 6] = [
    Rgba(255, 0, 0, 255),   // Red
    Rgba(0, 255, 0, 255),   // Green
    Rgba(0, 0, 255, 255),   // Blue
    Rgba(255, 255, 0, 255), // Yellow
    Rgba(255, 0, 255, 255), // Magenta
    Rgba(0, 255, 255, 255), // Cyan
];

const WIREFRAME_COLOR: Rgba = Rgba(40, 40, 40, 255);

/// Demonstration scene object: a cube resting on the bed.
#[derive(Debug, Clone)]
pub struct CubeModel {
    transform: ModelTransform,
    /// Degrees about z added before every paint
    spin: Option<f32>,
    wireframe: bool,
    changed: bool,
}

impl CubeModel {
    /// Cube with edge length `size` whose bottom face is centred on (`x`, `y`)
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        let half = size * 0.5;
        Self {
            transform: ModelTransform {
                position: Vec3::new(x, y, half),
                scale: Vec3::splat(half),
                ..ModelTransform::default()
            },
            spin: None,
            wireframe: false,
            changed: true,
        }
    }

    /// Turn about z by `degrees_per_frame` on every paint, or stop with `None`
    pub fn set_spin(&mut self, degrees_per_frame: Option<f32>) {
        self.spin = degrees_per_frame;
        self.changed = true;
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    /// Move on the bed plane
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.transform.position.x += dx;
        self.transform.position.y += dy;
        self.changed = true;
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    fn edges() -> Vec<[Vec3; 2]> {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for face in FACES {
            for i in 0..4 {
                let (a, b) = (face[i], face[(i + 1) % 4]);
                let edge = (a.min(b), a.max(b));
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
        edges
            .into_iter()
            .map(|(a, b)| [VERTICES[a], VERTICES[b]])
            .collect()
    }
}

impl SceneModel for CubeModel {
    fn transform(&self) -> ModelTransform {
        self.transform
    }

    fn paint(&mut self, backend: &mut dyn GraphicsBackend) {
        if self.wireframe {
            backend.set_color(WIREFRAME_COLOR);
            backend.draw_lines(&Self::edges());
        } else {
            for (face, color) in FACES.iter().zip(FACE_COLORS) {
                let [a, b, c, d] = face.map(|i| VERTICES[i]);
                backend.set_color(color);
                backend.draw_triangles(&[[a, b, c], [a, c, d]]);
            }
        }
        self.changed = false;
    }

    fn animation_before(&mut self) {
        if let Some(step) = self.spin {
            self.transform.rotation.z = (self.transform.rotation.z + step) % 360.0;
        }
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn has_animations(&self) -> bool {
        self.spin.is_some()
    }

    fn reduce_quality(&mut self) {
        if !self.wireframe {
            tracing::debug!("Cube switched to wireframe");
        }
        self.wireframe = true;
        self.changed = true;
    }

    fn clear(&mut self) {
        self.transform.rotation = Vec3::ZERO;
        self.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::SoftwareBackend;
    use glam::Mat4;

    const BACKGROUND: Rgba = Rgba(0, 0, 0, 255);

    fn ortho_backend() -> SoftwareBackend {
        let mut backend = SoftwareBackend::new(10, 10);
        backend.set_projection(Mat4::orthographic_rh_gl(-2.0, 2.0, -2.0, 2.0, -10.0, 10.0));
        backend.begin_frame(BACKGROUND).unwrap();
        backend
    }

    #[test]
    fn test_cube_has_twelve_edges() {
        assert_eq!(CubeModel::edges().len(), 12);
    }

    #[test]
    fn test_shaded_front_face() {
        let mut cube = CubeModel::new(0.0, 0.0, 2.0);
        let mut backend = ortho_backend();
        assert!(cube.changed());
        cube.paint(&mut backend);
        assert!(!cube.changed());
        // The +z face is nearest to an eye looking down -z
        assert_eq!(backend.framebuffer().pixel(5, 5), Some(FACE_COLORS[1]));
    }

    #[test]
    fn test_reduced_quality_draws_edges_only() {
        let mut cube = CubeModel::new(0.0, 0.0, 2.0);
        cube.reduce_quality();
        assert!(cube.is_wireframe());

        let mut backend = ortho_backend();
        cube.paint(&mut backend);
        assert_eq!(backend.framebuffer().pixel(5, 5), Some(BACKGROUND));
        assert_eq!(backend.framebuffer().pixel(5, 8), Some(WIREFRAME_COLOR));

        // Clearing does not restore the full representation
        cube.clear();
        assert!(cube.is_wireframe());
    }

    #[test]
    fn test_spin_animation() {
        let mut cube = CubeModel::new(0.0, 0.0, 2.0);
        assert!(!cube.has_animations());
        cube.set_spin(Some(15.0));
        assert!(cube.has_animations());
        cube.animation_before();
        cube.animation_before();
        assert_eq!(cube.transform().rotation.z, 30.0);

        cube.set_spin(None);
        cube.animation_before();
        assert_eq!(cube.transform().rotation.z, 30.0);
    }

    #[test]
    fn test_translate_marks_changed() {
        let mut cube = CubeModel::new(10.0, 20.0, 4.0);
        assert_eq!(cube.position(), Vec3::new(10.0, 20.0, 2.0));
        let mut backend = ortho_backend();
        cube.paint(&mut backend);

        cube.translate(1.0, -2.0);
        assert!(cube.changed());
        assert_eq!(cube.position(), Vec3::new(11.0, 18.0, 2.0));
    }
}
