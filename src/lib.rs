//! Interactive 3D build-volume viewport: orbit camera, pointer-driven
//! interaction, render-based picking and adaptive redraw scheduling over a
//! pluggable graphics backend.

pub mod backend;
pub mod bed;
pub mod camera;
pub mod capabilities;
pub mod config;
pub mod cube;
pub mod error;
pub mod graphics;
pub mod interaction;
pub mod math;
pub mod picking;
pub mod raster;
pub mod scene;
pub mod scheduler;
pub mod vertex;
pub mod viewport;
pub mod widget;

pub use backend::{GraphicsBackend, HitRecord, Rgba};
pub use camera::CameraState;
pub use capabilities::{Capabilities, QualityTier};
pub use config::ViewerConfig;
pub use error::{BackendError, ConfigError, ViewportError};
pub use interaction::{InteractionMode, Modifiers, PointerButton};
pub use raster::SoftwareBackend;
pub use scene::{ModelId, ModelTransform, SceneModel, SceneRegistry, SharedModel};
pub use viewport::{Viewport, ViewportEvent};
