//! Object picking through a selection render pass
//!
//! The projection is narrowed to a 1x1 pixel window around the cursor, every
//! registered model is drawn under a name equal to its registry position, and
//! the hit with the smallest minimum depth wins. Ties keep the earlier hit.

use glam::{Mat4, Vec3};

use crate::backend::{GraphicsBackend, HitRecord};
use crate::camera::CameraState;
use crate::config::PrintVolume;
use crate::error::ViewportError;
use crate::scene::{paint_model, ModelId, SceneRegistry, SharedModel};

/// Restrict drawing to a `width` x `height` window centred at window
/// coordinates (`x`, `y`), origin bottom-left. Multiply onto the normal
/// projection from the left.
pub fn pick_matrix(x: f32, y: f32, width: f32, height: f32, viewport: (u32, u32)) -> Mat4 {
    if width <= 0.0 || height <= 0.0 {
        return Mat4::IDENTITY;
    }
    let (vw, vh) = (viewport.0 as f32, viewport.1 as f32);
    let translate = Vec3::new((vw - 2.0 * x) / width, (vh - 2.0 * y) / height, 0.0);
    let scale = Vec3::new(vw / width, vh / height, 1.0);
    Mat4::from_translation(translate) * Mat4::from_scale(scale)
}

/// Name of the nearest hit; the first one wins among equal depths
pub fn resolve_hits(hits: &[HitRecord]) -> Option<u32> {
    let mut nearest: Option<&HitRecord> = None;
    for hit in hits {
        if nearest.map_or(true, |best| hit.min_depth < best.min_depth) {
            nearest = Some(hit);
        }
    }
    nearest.map(|hit| hit.name)
}

/// Find the model under screen position (`x`, `y`), origin top-left.
///
/// The backend must not be inside a frame. Its projection is restored to the
/// camera projection afterwards, even when the pass fails.
pub fn pick(
    backend: &mut dyn GraphicsBackend,
    camera: &CameraState,
    registry: &SceneRegistry,
    volume: &PrintVolume,
    x: f32,
    y: f32,
) -> Result<Option<ModelId>, ViewportError> {
    let models = registry.snapshot();
    if models.is_empty() {
        return Ok(None);
    }

    let (width, height) = backend.viewport_size();
    let projection = camera.compute_projection(width, height).matrix;

    backend.begin_select()?;
    backend.set_projection(pick_matrix(x, height as f32 - y, 1.0, 1.0, (width, height)) * projection);
    backend.load_modelview(camera.scene_matrix(volume));

    let painted = paint_named(backend, &models);
    let hits = backend.end_select();
    backend.set_projection(projection);
    painted?;
    let hits = hits?;

    tracing::debug!(x, y, hits = hits.len(), "Pick pass finished");
    Ok(resolve_hits(&hits)
        .and_then(|name| models.get(name as usize))
        .map(|(id, _)| *id))
}

fn paint_named(
    backend: &mut dyn GraphicsBackend,
    models: &[(ModelId, SharedModel)],
) -> Result<(), ViewportError> {
    for (name, (id, model)) in models.iter().enumerate() {
        backend.push_name(name as u32);
        let painted = paint_model(backend, *id, model);
        backend.pop_name();
        painted?;
    }
    Ok(())
}
