use glam::{Mat4, Vec3};

use crate::config::PrintVolume;

pub const MIN_ZOOM: f32 = 0.01;
pub const MAX_ZOOM: f32 = 10.0;

/// Initial tilt so the bed is seen slightly from above
pub const RESET_ROT_X: f32 = 20.0;

/// Wheel units per full zoom step; one notch (120) shrinks zoom by 24%
pub const WHEEL_ZOOM_DIVISOR: f32 = 500.0;
pub const KEY_ZOOM_IN: f32 = 0.95;
pub const KEY_ZOOM_OUT: f32 = 1.05;

/// Vertical field of view at zoom 1
const BASE_FOV_DEGREES: f32 = 30.0;
/// Keeps the projection valid at high zoom factors
const MAX_FOV_DEGREES: f32 = 170.0;
const MIN_NEAR: f32 = 10.0;
const MIN_DEPTH_RANGE: f32 = 1.0;

/// Camera values captured at the start of a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub view_center: Vec3,
    pub eye: Vec3,
    pub rot_x: f32,
    pub rot_z: f32,
}

/// Derived projection parameters for one viewport size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Height of the frustum at the near plane
    pub near_height: f32,
    pub matrix: Mat4,
}

#[derive(Debug, Clone)]
pub struct CameraState {
    /// Look-at target
    pub view_center: Vec3,
    /// Eye position
    pub eye: Vec3,
    /// Tilt about the x axis, degrees
    pub rot_x: f32,
    /// Turn about the z axis, degrees
    pub rot_z: f32,
    zoom: f32,
    /// Half the depth range kept around the target (print area depth)
    depth_margin: f32,
}

impl CameraState {
    /// Camera in its reset pose for the given build volume
    pub fn new(volume: &PrintVolume) -> Self {
        let mut camera = Self {
            view_center: Vec3::ZERO,
            eye: Vec3::ZERO,
            rot_x: 0.0,
            rot_z: 0.0,
            zoom: 1.0,
            depth_margin: volume.depth,
        };
        camera.reset(volume);
        camera
    }

    /// Return to the default view: target at the volume centre, eye in front of it.
    pub fn reset(&mut self, volume: &PrintVolume) {
        self.rot_x = RESET_ROT_X;
        self.rot_z = 0.0;
        self.zoom = 1.0;
        self.depth_margin = volume.depth;
        self.view_center = Vec3::ZERO;
        self.eye = Vec3::new(0.0, -2.0 * volume.depth, 0.0);
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Multiply zoom by `factor`, clamping into [MIN_ZOOM, MAX_ZOOM]
    pub fn apply_zoom(&mut self, factor: f32) {
        let zoom = self.zoom * factor;
        self.zoom = if zoom.is_nan() {
            MIN_ZOOM
        } else {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        };
    }

    /// Zoom from a mouse wheel delta (120 units per notch, positive zooms in)
    pub fn wheel_zoom(&mut self, delta: f32) {
        if delta != 0.0 {
            self.apply_zoom(1.0 - delta / WHEEL_ZOOM_DIVISOR);
        }
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            view_center: self.view_center,
            eye: self.eye,
            rot_x: self.rot_x,
            rot_z: self.rot_z,
        }
    }

    /// Derive aspect, field of view, clip planes and the projection matrix.
    pub fn compute_projection(&self, width: u32, height: u32) -> Projection {
        let distance = self.view_center.distance(self.eye);
        let near = (distance - 2.0 * self.depth_margin).max(MIN_NEAR);
        let far = (distance + 2.0 * self.depth_margin).max(near + MIN_DEPTH_RANGE);
        let fov_y = (self.zoom * BASE_FOV_DEGREES)
            .min(MAX_FOV_DEGREES)
            .to_radians();
        let aspect = width.max(1) as f32 / height.max(1) as f32;

        Projection {
            aspect,
            fov_y,
            near,
            far,
            near_height: 2.0 * (fov_y * 0.5).tan() * near,
            matrix: Mat4::perspective_rh_gl(fov_y, aspect, near, far),
        }
    }

    /// Look-at matrix with the z axis up
    pub fn view_matrix(&self) -> Mat4 {
        let mut forward = self.view_center - self.eye;
        if forward.length_squared() < f32::EPSILON {
            forward = Vec3::Y;
        }
        // Looking straight up or down leaves z unusable as the up vector
        let up = if forward.cross(Vec3::Z).length_squared() < f32::EPSILON {
            Vec3::Y
        } else {
            Vec3::Z
        };
        Mat4::look_to_rh(self.eye, forward.normalize(), up)
    }

    /// View matrix followed by the scene orientation: rotate about x, then z,
    /// around the centre of the build volume.
    pub fn scene_matrix(&self, volume: &PrintVolume) -> Mat4 {
        self.view_matrix()
            * Mat4::from_rotation_x(self.rot_x.to_radians())
            * Mat4::from_rotation_z(self.rot_z.to_radians())
            * Mat4::from_translation(Vec3::new(
                -0.5 * volume.width,
                -0.5 * volume.depth,
                -0.5 * volume.height,
            ))
    }
}
