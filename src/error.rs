use std::path::PathBuf;

use crate::scene::ModelId;

/// Failure reported by a graphics backend during a frame or pick pass
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The render surface or device context cannot be used right now
    #[error("render surface unavailable: {0}")]
    Unavailable(String),

    /// Transient device error while submitting or presenting
    #[error("device error: {0}")]
    Device(String),

    /// A call arrived in a state the backend cannot honour (e.g. nested selection)
    #[error("invalid backend state: {0}")]
    InvalidState(&'static str),
}

/// Error raised by a viewport pass
#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The model is borrowed by its owner and cannot be painted this pass
    #[error("model {0:?} is busy")]
    ModelBusy(ModelId),

    /// Clearing is only offered while the viewport updates itself
    #[error("scene clearing is disabled while auto-update is off")]
    ClearDisabled,
}

/// Error loading a viewer configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
