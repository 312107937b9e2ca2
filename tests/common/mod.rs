#![allow(dead_code)]

use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;

use bedview::backend::{BackendInfo, GraphicsBackend, HitRecord, Light, Rgba};
use bedview::capabilities::Capabilities;
use bedview::config::ViewerConfig;
use bedview::error::BackendError;
use bedview::raster::SoftwareBackend;
use bedview::scene::{ModelTransform, SceneModel, SharedModel};
use bedview::viewport::Viewport;

pub const WIDTH: u32 = 80;
pub const HEIGHT: u32 = 60;

/// Upright 80 x 80 square in the bed's x-z plane, centred over the middle of
/// a default bed at depth `y`, facing the reset camera.
#[derive(Debug, Default)]
pub struct Panel {
    pub y: f32,
    pub changed: bool,
    pub paints: u32,
    pub clears: u32,
    pub reductions: u32,
}

impl Panel {
    pub fn at(y: f32) -> Rc<RefCell<Panel>> {
        Rc::new(RefCell::new(Panel {
            y,
            ..Panel::default()
        }))
    }
}

impl SceneModel for Panel {
    fn transform(&self) -> ModelTransform {
        ModelTransform {
            position: Vec3::new(100.0, self.y, 50.0),
            ..ModelTransform::default()
        }
    }

    fn paint(&mut self, backend: &mut dyn GraphicsBackend) {
        let h = 40.0;
        let (a, b, c, d) = (
            Vec3::new(-h, 0.0, -h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(h, 0.0, h),
            Vec3::new(-h, 0.0, h),
        );
        backend.set_color(Rgba(90, 120, 200, 255));
        backend.draw_triangles(&[[a, b, c], [a, c, d]]);
        self.paints += 1;
        self.changed = false;
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn reduce_quality(&mut self) {
        self.reductions += 1;
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// Square spanning [-1, 1] in the local x-z plane, placed by an arbitrary transform
#[derive(Debug)]
pub struct Slab {
    pub transform: ModelTransform,
}

impl Slab {
    pub fn with(transform: ModelTransform) -> Rc<RefCell<Slab>> {
        Rc::new(RefCell::new(Slab { transform }))
    }
}

impl SceneModel for Slab {
    fn transform(&self) -> ModelTransform {
        self.transform
    }

    fn paint(&mut self, backend: &mut dyn GraphicsBackend) {
        let (a, b, c, d) = (
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        );
        backend.set_color(Rgba(200, 90, 90, 255));
        backend.draw_triangles(&[[a, b, c], [a, c, d]]);
    }

    fn changed(&self) -> bool {
        false
    }

    fn reduce_quality(&mut self) {}

    fn clear(&mut self) {}
}

pub fn shared<M: SceneModel + 'static>(model: &Rc<RefCell<M>>) -> SharedModel {
    model.clone()
}

pub fn software_viewport(config: ViewerConfig) -> Viewport<SoftwareBackend> {
    let backend = SoftwareBackend::new(WIDTH, HEIGHT);
    let capabilities = Capabilities::probe(&backend.info());
    Viewport::new(backend, config, capabilities)
}

/// Software backend whose frame and pick passes can be made to fail
pub struct FlakyBackend {
    pub inner: SoftwareBackend,
    pub fail_frames: bool,
    pub fail_picks: bool,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self {
            inner: SoftwareBackend::new(WIDTH, HEIGHT),
            fail_frames: false,
            fail_picks: false,
        }
    }
}

impl GraphicsBackend for FlakyBackend {
    fn info(&self) -> BackendInfo {
        self.inner.info()
    }
    fn viewport_size(&self) -> (u32, u32) {
        self.inner.viewport_size()
    }
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.inner.set_viewport(width, height)
    }
    fn begin_frame(&mut self, clear: Rgba) -> Result<(), BackendError> {
        if self.fail_frames {
            return Err(BackendError::Device("lost context".to_string()));
        }
        self.inner.begin_frame(clear)
    }
    fn present(&mut self) -> Result<(), BackendError> {
        self.inner.present()
    }
    fn discard_frame(&mut self) {
        self.inner.discard_frame()
    }
    fn set_projection(&mut self, projection: glam::Mat4) {
        self.inner.set_projection(projection)
    }
    fn projection(&self) -> glam::Mat4 {
        self.inner.projection()
    }
    fn load_modelview(&mut self, matrix: glam::Mat4) {
        self.inner.load_modelview(matrix)
    }
    fn mult_modelview(&mut self, matrix: glam::Mat4) {
        self.inner.mult_modelview(matrix)
    }
    fn push_matrix(&mut self) {
        self.inner.push_matrix()
    }
    fn pop_matrix(&mut self) {
        self.inner.pop_matrix()
    }
    fn set_lighting(&mut self, ambient: f32, lights: &[Light]) {
        self.inner.set_lighting(ambient, lights)
    }
    fn set_blending(&mut self, enabled: bool) {
        self.inner.set_blending(enabled)
    }
    fn set_color(&mut self, color: Rgba) {
        self.inner.set_color(color)
    }
    fn draw_lines(&mut self, segments: &[[Vec3; 2]]) {
        self.inner.draw_lines(segments)
    }
    fn draw_triangles(&mut self, triangles: &[[Vec3; 3]]) {
        self.inner.draw_triangles(triangles)
    }
    fn begin_select(&mut self) -> Result<(), BackendError> {
        if self.fail_picks {
            return Err(BackendError::Unavailable("surface detached".to_string()));
        }
        self.inner.begin_select()
    }
    fn push_name(&mut self, name: u32) {
        self.inner.push_name(name)
    }
    fn pop_name(&mut self) {
        self.inner.pop_name()
    }
    fn end_select(&mut self) -> Result<Vec<HitRecord>, BackendError> {
        self.inner.end_select()
    }
}
