//! The viewport context: owns the camera, the interaction controller, the
//! model registry and the render-loop scheduler, and runs frame and pick
//! passes against one graphics backend.
//!
//! Hosts feed it input events and a fixed-rate [`Viewport::tick`]; outgoing
//! notifications are queued and drained with [`Viewport::take_events`].

use glam::{Vec2, Vec3};
use std::collections::VecDeque;
use std::time::Instant;

use crate::backend::{GraphicsBackend, Light};
use crate::bed::BedGeometry;
use crate::camera::{CameraState, KEY_ZOOM_IN, KEY_ZOOM_OUT};
use crate::capabilities::{Capabilities, QualityTier};
use crate::config::ViewerConfig;
use crate::error::ViewportError;
use crate::interaction::{InteractionController, InteractionMode, Modifiers, PointerButton, TickOutcome};
use crate::picking;
use crate::scene::{paint_model, ModelId, SceneRegistry, SharedModel};
use crate::scheduler::RenderLoopScheduler;

/// Directions (towards the light, view space) and diffuse levels of the four
/// switchable lights
const FIXED_LIGHTS: [(Vec3, f32); 4] = [
    (Vec3::new(-1.0, -1.0, 2.0), 0.8),
    (Vec3::new(100.0, 200.0, 300.0), 0.7),
    (Vec3::new(100.0, -200.0, 200.0), 0.8),
    (Vec3::new(170.0, -100.0, -250.0), 0.7),
];

/// Notification for the owning application
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// A select-button press hit this model
    ObjectSelected(ModelId),
    /// Move the selected object by this many world units
    ObjectMoved { dx: f32, dy: f32 },
}

pub struct Viewport<B: GraphicsBackend> {
    backend: B,
    config: ViewerConfig,
    capabilities: Capabilities,
    camera: CameraState,
    controller: InteractionController,
    registry: SceneRegistry,
    scheduler: RenderLoopScheduler,
    bed: BedGeometry,
    events: VecDeque<ViewportEvent>,
    visible: bool,
    invalidated: bool,
    auto_update: bool,
}

impl<B: GraphicsBackend> Viewport<B> {
    /// `capabilities` comes from a single [`Capabilities::probe`] done by the
    /// application before any viewport is created.
    pub fn new(backend: B, config: ViewerConfig, capabilities: Capabilities) -> Self {
        let tier = capabilities.resolve_tier(config.render.draw_method);
        let (width, height) = backend.viewport_size();
        tracing::info!(?tier, width, height, "Viewport created");

        Self {
            camera: CameraState::new(&config.volume),
            controller: InteractionController::new(width, height),
            registry: SceneRegistry::new(),
            scheduler: RenderLoopScheduler::new(tier, &config.render),
            bed: BedGeometry::new(&config.volume),
            events: VecDeque::new(),
            visible: true,
            invalidated: true,
            auto_update: true,
            backend,
            config,
            capabilities,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn tier(&self) -> QualityTier {
        self.scheduler.tier()
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn scheduler(&self) -> &RenderLoopScheduler {
        &self.scheduler
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn add_model(&mut self, model: &SharedModel) -> ModelId {
        self.invalidated = true;
        self.registry.add(model)
    }

    pub fn remove_model(&mut self, id: ModelId) -> Option<SharedModel> {
        self.invalidated = true;
        self.registry.remove(id)
    }

    /// Pending notifications, oldest first
    pub fn take_events(&mut self) -> Vec<ViewportEvent> {
        self.events.drain(..).collect()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton, modifiers: Modifiers) {
        let wants_pick = self
            .controller
            .pointer_down(Vec2::new(x, y), button, modifiers, &self.camera);
        if wants_pick {
            if let Some(id) = self.select_at(x, y) {
                self.events.push_back(ViewportEvent::ObjectSelected(id));
            }
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.controller.pointer_move(Vec2::new(x, y), modifiers);
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    /// Mouse wheel, 120 units per notch
    pub fn wheel(&mut self, delta: f32) {
        self.camera.wheel_zoom(delta);
        self.invalidated = true;
    }

    /// Keyboard zoom. Returns false for keys the viewport does not handle.
    pub fn key_press(&mut self, key: char) -> bool {
        let factor = match key {
            '+' => KEY_ZOOM_IN,
            '-' => KEY_ZOOM_OUT,
            _ => return false,
        };
        self.camera.apply_zoom(factor);
        self.invalidated = true;
        true
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.set_viewport(width, height);
        self.controller.set_viewport_size(width, height);
        self.invalidated = true;
    }

    /// Pin an interaction mode (toolbar selection)
    pub fn set_mode(&mut self, mode: InteractionMode) -> bool {
        let accepted = self.controller.set_mode(mode);
        self.invalidated |= accepted;
        accepted
    }

    pub fn set_editor(&mut self, enabled: bool) {
        self.controller.set_editor(enabled);
    }

    /// Enable or disable the move-object control surface
    pub fn set_object_selected(&mut self, selected: bool) {
        self.controller.set_object_selected(selected);
    }

    /// Attach or detach the render surface
    pub fn make_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.invalidated = true;
        }
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Request a redraw on the next tick
    pub fn update_changes(&mut self) {
        self.invalidated = true;
    }

    /// Start or stop the periodic work done by [`Viewport::tick`]. While
    /// stopped, ticks neither follow drags nor run the redraw policy; only
    /// explicit redraw requests are drawn. Clearing the scene is disabled.
    pub fn set_auto_update(&mut self, enabled: bool) {
        if enabled == self.auto_update {
            return;
        }
        tracing::info!(enabled, "Auto-update toggled");
        self.auto_update = enabled;
        if enabled {
            self.controller.restart_clock();
            self.invalidated = true;
        }
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Reset every model's geometry state; membership is unchanged
    pub fn clear_scene(&mut self) -> Result<(), ViewportError> {
        if !self.auto_update {
            return Err(ViewportError::ClearDisabled);
        }
        self.invalidated = true;
        self.registry.clear_all()
    }

    pub fn reset_view(&mut self) {
        self.camera.reset(&self.config.volume);
        self.invalidated = true;
    }

    /// Fixed-rate callback: applies the interaction control law, then renders
    /// if the scene asks for it. Returns true when a frame was presented.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.auto_update {
            return self.visible && self.invalidated && self.try_render();
        }

        match self.controller.tick(now, &mut self.camera) {
            TickOutcome::CameraChanged => self.invalidated = true,
            TickOutcome::ObjectMoved(delta) => self.events.push_back(ViewportEvent::ObjectMoved {
                dx: delta.x,
                dy: delta.y,
            }),
            TickOutcome::Idle => {}
        }

        self.registry.prune();
        let scheduled = self.scheduler.should_redraw(self.registry.activity());
        if !self.visible || !(scheduled || self.invalidated) {
            return false;
        }
        self.try_render()
    }

    fn try_render(&mut self) -> bool {
        match self.render_frame() {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "Frame skipped");
                false
            }
        }
    }

    /// Render and present one frame, then account its duration.
    pub fn render_frame(&mut self) -> Result<(), ViewportError> {
        let started = Instant::now();
        self.backend.begin_frame(self.config.colors.background)?;
        if let Err(error) = self.paint_scene() {
            self.backend.discard_frame();
            return Err(error);
        }
        self.backend.present()?;
        self.invalidated = false;

        let elapsed = started.elapsed();
        tracing::debug!(?elapsed, "Frame presented");
        if self.scheduler.record_frame(elapsed) {
            if let Err(error) = self.registry.reduce_quality_all() {
                tracing::warn!(%error, "Quality reduction incomplete");
            }
        }
        Ok(())
    }

    fn paint_scene(&mut self) -> Result<(), ViewportError> {
        let (width, height) = self.backend.viewport_size();
        let projection = self.camera.compute_projection(width, height);
        self.backend.set_projection(projection.matrix);

        // Lights are fixed relative to the viewer
        self.backend.load_modelview(self.camera.view_matrix());
        let lights = self.enabled_lights();
        self.backend.set_lighting(self.config.lighting.ambient, &lights);

        self.backend
            .load_modelview(self.camera.scene_matrix(&self.config.volume));
        let show_printbed = self.config.render.show_printbed;
        let bed_color = self.config.colors.printbed;
        if show_printbed {
            self.bed.draw_lines(&mut self.backend, bed_color);
        }
        for (id, model) in self.registry.snapshot() {
            paint_model(&mut self.backend, id, &model)?;
        }
        if show_printbed {
            self.bed.draw_plate(&mut self.backend, bed_color);
        }
        Ok(())
    }

    fn enabled_lights(&self) -> Vec<Light> {
        FIXED_LIGHTS
            .iter()
            .zip(self.config.lighting.lights)
            .filter(|(_, enabled)| *enabled)
            .map(|(&(direction, diffuse), _)| Light { direction, diffuse })
            .collect()
    }

    /// Model under the pointer; none while the surface is hidden or the pass fails
    fn select_at(&mut self, x: f32, y: f32) -> Option<ModelId> {
        if !self.visible {
            return None;
        }
        match picking::pick(
            &mut self.backend,
            &self.camera,
            &self.registry,
            &self.config.volume,
            x,
            y,
        ) {
            Ok(hit) => hit,
            Err(error) => {
                tracing::warn!(%error, "Pick skipped");
                None
            }
        }
    }
}
