//! Pointer-driven camera and object manipulation
//!
//! Input events only update the drag session. Camera and object changes are
//! applied on the scheduler tick, under one of two control laws:
//!
//! * Orbit, PanEye and PanTarget recompute their value from the drag-start
//!   snapshot and the current pointer offset, so a stationary pointer holds
//!   the view still no matter how many ticks fire.
//! * Dolly and MoveObject integrate from the previous tick, so a pointer held
//!   away from the drag origin keeps moving the eye (or the object).

use glam::Vec2;
use std::time::Instant;

use crate::camera::{CameraSnapshot, CameraState};

/// Degrees of rotation at full pointer deflection
pub const ORBIT_GAIN: f32 = 50.0;
/// World units of pan at full deflection and zoom 1
pub const PAN_GAIN: f32 = 200.0;
/// Milliseconds per world unit of dolly at full deflection
pub const DOLLY_DIVISOR: f32 = 10.0;
/// World units an object moves when dragged across the whole viewport at zoom 1
pub const MOVE_GAIN: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Orbit,
    PanEye,
    PanTarget,
    Dolly,
    MoveObject,
}

impl InteractionMode {
    /// Rate-control modes integrate over time instead of tracking the pointer offset
    pub fn is_rate_control(self) -> bool {
        matches!(self, InteractionMode::Dolly | InteractionMode::MoveObject)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    /// Selects objects on press
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
    };

    fn shift_only(self) -> bool {
        self.shift && !self.control && !self.alt
    }

    fn control_only(self) -> bool {
        self.control && !self.shift && !self.alt
    }

    fn alt_only(self) -> bool {
        self.alt && !self.shift && !self.control
    }
}

/// State of the current (or most recent) drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub start: Vec2,
    pub start_camera: CameraSnapshot,
    pub current: Vec2,
    /// Pointer position consumed by the previous MoveObject tick
    pub last: Vec2,
    /// Pointer offset from `start` in units of the reference distance, each axis in [-1, 1]
    pub speed: Vec2,
}

/// Effect of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    CameraChanged,
    /// Object displacement in world units; y is positive away from the viewer
    ObjectMoved(Vec2),
}

#[derive(Debug)]
pub struct InteractionController {
    pinned: InteractionMode,
    editor: bool,
    object_selected: bool,
    session: Option<DragSession>,
    button: Option<PointerButton>,
    modifiers: Modifiers,
    viewport: (u32, u32),
    pointer_ndc: Vec2,
    last_tick: Option<Instant>,
}

impl InteractionController {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pinned: InteractionMode::Orbit,
            editor: false,
            object_selected: false,
            session: None,
            button: None,
            modifiers: Modifiers::NONE,
            viewport: (width, height),
            pointer_ndc: Vec2::ZERO,
            last_tick: None,
        }
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Mode selected on the toolbar
    pub fn mode(&self) -> InteractionMode {
        self.pinned
    }

    /// Pin a mode. MoveObject needs the editor and a selected object.
    pub fn set_mode(&mut self, mode: InteractionMode) -> bool {
        if mode == InteractionMode::MoveObject && !self.move_object_available() {
            tracing::debug!("Move-object mode unavailable");
            return false;
        }
        if self.pinned != mode {
            tracing::info!(?mode, "Interaction mode pinned");
        }
        self.pinned = mode;
        true
    }

    pub fn set_editor(&mut self, enabled: bool) {
        self.editor = enabled;
        self.drop_unavailable_move_mode();
    }

    pub fn editor(&self) -> bool {
        self.editor
    }

    pub fn set_object_selected(&mut self, selected: bool) {
        self.object_selected = selected;
        self.drop_unavailable_move_mode();
    }

    fn move_object_available(&self) -> bool {
        self.editor && self.object_selected
    }

    fn drop_unavailable_move_mode(&mut self) {
        if self.pinned == InteractionMode::MoveObject && !self.move_object_available() {
            self.pinned = InteractionMode::Orbit;
        }
    }

    /// Mode applied on the next tick: the pinned mode unless a modifier or
    /// button overrides it.
    pub fn effective_mode(&self) -> InteractionMode {
        let mut mode = self.pinned;
        if self.modifiers.shift_only() || self.button == Some(PointerButton::Middle) {
            mode = InteractionMode::PanTarget;
        }
        if self.modifiers.control_only() {
            mode = InteractionMode::Orbit;
        }
        if self.modifiers.alt_only() || self.button == Some(PointerButton::Secondary) {
            mode = InteractionMode::MoveObject;
        }
        if mode == InteractionMode::MoveObject && !self.editor {
            mode = match self.pinned {
                InteractionMode::MoveObject => InteractionMode::Orbit,
                pinned => pinned,
            };
        }
        mode
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.button.is_some()
    }

    /// Pointer position in normalised device coordinates, y up
    pub fn pointer_ndc(&self) -> Vec2 {
        self.pointer_ndc
    }

    /// Start a drag. Returns true when the press should trigger a pick.
    pub fn pointer_down(
        &mut self,
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        camera: &CameraState,
    ) -> bool {
        self.button = Some(button);
        self.modifiers = modifiers;
        self.session = Some(DragSession {
            start: position,
            start_camera: camera.snapshot(),
            current: position,
            last: position,
            speed: Vec2::ZERO,
        });
        button == PointerButton::Secondary
    }

    pub fn pointer_move(&mut self, position: Vec2, modifiers: Modifiers) {
        let (width, height) = (self.viewport.0.max(1) as f32, self.viewport.1.max(1) as f32);
        self.pointer_ndc = Vec2::new(
            (position.x - width / 2.0) * 2.0 / width,
            ((height - position.y) - height / 2.0) * 2.0 / height,
        );
        self.modifiers = modifiers;

        let reference = self.reference_distance();
        let dragging = self.button.is_some();
        if let Some(session) = self.session.as_mut() {
            if !dragging {
                session.speed = Vec2::ZERO;
                return;
            }
            session.current = position;
            session.speed =
                ((position - session.start) / reference).clamp(Vec2::splat(-1.0), Vec2::ONE);
        }
    }

    /// End the drag; the session snapshot stays until the next press
    pub fn pointer_up(&mut self) {
        self.button = None;
        if let Some(session) = self.session.as_mut() {
            session.speed = Vec2::ZERO;
        }
    }

    /// Pointer offset giving full deflection
    fn reference_distance(&self) -> f32 {
        (self.viewport.0.min(self.viewport.1) as f32 / 3.0).max(1.0)
    }

    /// Forget the previous tick time so the next tick integrates nothing
    pub fn restart_clock(&mut self) {
        self.last_tick = None;
    }

    /// Apply the active control law. `now` drives the rate-control modes.
    pub fn tick(&mut self, now: Instant, camera: &mut CameraState) -> TickOutcome {
        let dt_ms = self
            .last_tick
            .map(|last| now.saturating_duration_since(last).as_secs_f32() * 1000.0)
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        if self.button.is_none() {
            return TickOutcome::Idle;
        }
        let mode = self.effective_mode();
        let (width, height) = (self.viewport.0.max(1) as f32, self.viewport.1.max(1) as f32);
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };

        let before = camera.snapshot();
        let start = session.start_camera;
        let speed = session.speed;
        let zoom = camera.zoom();

        match mode {
            InteractionMode::Orbit => {
                camera.rot_z = start.rot_z + speed.x * ORBIT_GAIN;
                camera.rot_x = start.rot_x + speed.y * ORBIT_GAIN;
            }
            InteractionMode::PanEye => {
                camera.eye.x = start.eye.x + speed.x * PAN_GAIN * zoom;
                camera.eye.z = start.eye.z - speed.y * PAN_GAIN * zoom;
            }
            InteractionMode::PanTarget => {
                camera.view_center.x = start.view_center.x - speed.x * PAN_GAIN * zoom;
                camera.view_center.z = start.view_center.z + speed.y * PAN_GAIN * zoom;
            }
            InteractionMode::Dolly => {
                camera.eye.y += dt_ms * speed.y * speed.y.abs() / DOLLY_DIVISOR;
            }
            InteractionMode::MoveObject => {
                let delta = (session.current - session.last) * MOVE_GAIN * zoom
                    / Vec2::new(width, height);
                session.last = session.current;
                // Reported on every tick of the drag, still pointer included
                return TickOutcome::ObjectMoved(Vec2::new(delta.x, -delta.y));
            }
        }

        if camera.snapshot() != before {
            TickOutcome::CameraChanged
        } else {
            TickOutcome::Idle
        }
    }
}
