use glam::{Mat4, Vec3};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::backend::GraphicsBackend;
use crate::error::ViewportError;

/// Model shared between its owner and the viewport
pub type SharedModel = Rc<RefCell<dyn SceneModel>>;

/// Stable identifier handed out by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

/// Placement of a model on the bed. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl ModelTransform {
    /// Translate, rotate z then y then x, scale
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

/// What the viewport needs from a renderable object
pub trait SceneModel {
    fn transform(&self) -> ModelTransform;

    /// Emit geometry in model space; the model transform is already applied
    fn paint(&mut self, backend: &mut dyn GraphicsBackend);

    /// Called right before the transform is applied and `paint` runs
    fn animation_before(&mut self) {}

    /// Called right after `paint`
    fn animation_after(&mut self) {}

    /// Geometry or placement changed since the last paint
    fn changed(&self) -> bool;

    fn has_animations(&self) -> bool {
        false
    }

    /// Switch to a cheaper representation after sustained slow frames
    fn reduce_quality(&mut self);

    /// Reset accumulated geometry state
    fn clear(&mut self);
}

/// Aggregated redraw hints of all live models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneActivity {
    /// At least one model changed or animates
    pub pending: bool,
    /// At least one model animates
    pub animating: bool,
}

struct RegistryEntry {
    id: ModelId,
    model: Weak<RefCell<dyn SceneModel>>,
}

/// Ordered, non-owning list of scene models
#[derive(Default)]
pub struct SceneRegistry {
    entries: Vec<RegistryEntry>,
    next_id: u64,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model at the end of the paint order
    pub fn add(&mut self, model: &SharedModel) -> ModelId {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        self.entries.push(RegistryEntry {
            id,
            model: Rc::downgrade(model),
        });
        tracing::debug!(?id, count = self.entries.len(), "Model registered");
        id
    }

    pub fn remove(&mut self, id: ModelId) -> Option<SharedModel> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(index);
        tracing::debug!(?id, count = self.entries.len(), "Model removed");
        entry.model.upgrade()
    }

    pub fn get(&self, id: ModelId) -> Option<SharedModel> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.model.upgrade())
    }

    /// Number of registered entries, including ones whose owner dropped the model
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose model no longer exists
    pub fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|e| e.model.strong_count() > 0);
        if self.entries.len() != before {
            tracing::debug!(removed = before - self.entries.len(), "Pruned dropped models");
        }
    }

    /// Live models in registry order, for one render or pick pass
    pub fn snapshot(&self) -> Vec<(ModelId, SharedModel)> {
        self.entries
            .iter()
            .filter_map(|e| e.model.upgrade().map(|m| (e.id, m)))
            .collect()
    }

    /// Redraw hints; models currently borrowed by their owner are skipped
    pub fn activity(&self) -> SceneActivity {
        let mut activity = SceneActivity::default();
        for (_, model) in self.snapshot() {
            if let Ok(model) = model.try_borrow() {
                let animating = model.has_animations();
                activity.pending |= animating || model.changed();
                activity.animating |= animating;
            }
        }
        activity
    }

    /// Clear geometry state of every model; membership is unchanged
    pub fn clear_all(&self) -> Result<(), ViewportError> {
        self.for_each_mut(|model| model.clear())
    }

    /// Ask every model to use a cheaper representation
    pub fn reduce_quality_all(&self) -> Result<(), ViewportError> {
        self.for_each_mut(|model| model.reduce_quality())
    }

    fn for_each_mut(&self, mut f: impl FnMut(&mut dyn SceneModel)) -> Result<(), ViewportError> {
        let mut busy = None;
        for (id, model) in self.snapshot() {
            match model.try_borrow_mut() {
                Ok(mut model) => f(&mut *model),
                Err(_) => busy = busy.or(Some(id)),
            }
        }
        match busy {
            Some(id) => Err(ViewportError::ModelBusy(id)),
            None => Ok(()),
        }
    }
}

/// Paint one model under its transform, bracketed by its animation hooks.
/// Shared by the frame pass and the pick pass so both see identical geometry.
pub fn paint_model(
    backend: &mut dyn GraphicsBackend,
    id: ModelId,
    model: &SharedModel,
) -> Result<(), ViewportError> {
    let mut model = model
        .try_borrow_mut()
        .map_err(|_| ViewportError::ModelBusy(id))?;
    backend.push_matrix();
    model.animation_before();
    backend.mult_modelview(model.transform().matrix());
    model.paint(backend);
    model.animation_after();
    backend.pop_matrix();
    Ok(())
}
