use crate::backend::BackendInfo;
use crate::config::DrawMethod;

/// Extension that makes vertex-buffer drawing available
const VBO_EXTENSION: &str = "GL_ARB_vertex_buffer_object";

/// Version assumed when the backend's version string cannot be parsed
const FALLBACK_VERSION: f32 = 1.1;

/// Result of the one-time backend probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    pub version: f32,
    pub vertex_buffers: bool,
}

/// Rendering detail level. Ordered from cheapest to most detailed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityTier {
    /// Immediate-mode submission
    Low,
    /// Indexed draw calls
    Medium,
    /// Vertex buffer objects
    High,
}

impl Capabilities {
    /// Probe the backend's identification strings.
    ///
    /// Run once by the application context before any viewport is built; the
    /// result is passed into each viewport as configuration.
    pub fn probe(info: &BackendInfo) -> Self {
        tracing::info!(version = %info.version, "Backend version");
        tracing::info!(renderer = %info.renderer, "Backend renderer");
        tracing::debug!(extensions = %info.extensions, "Backend extensions");

        let version = parse_version(&info.version).unwrap_or(FALLBACK_VERSION);
        let vertex_buffers =
            version > 1.49 && info.extensions.split_whitespace().any(|e| e == VBO_EXTENSION);

        if vertex_buffers {
            tracing::info!("Using fast vertex buffers for rendering is possible");
        } else {
            tracing::info!("Vertex buffers not supported, using slower default method");
        }

        Self {
            version,
            vertex_buffers,
        }
    }

    /// Resolve the configured draw method into a quality tier.
    pub fn resolve_tier(&self, method: DrawMethod) -> QualityTier {
        match method {
            DrawMethod::Autodetect => {
                if self.vertex_buffers && self.version >= 1.499 {
                    QualityTier::High
                } else if self.version >= 1.099 {
                    QualityTier::Medium
                } else {
                    QualityTier::Low
                }
            }
            DrawMethod::VertexBuffers => QualityTier::High,
            DrawMethod::DrawElements => QualityTier::Medium,
            DrawMethod::Immediate => QualityTier::Low,
        }
    }
}

/// Leading numeric token of a version string ("2.1 Mesa 23.0" -> 2.1)
fn parse_version(text: &str) -> Option<f32> {
    let token = text.split_whitespace().next()?;
    // Drivers report "major.minor.release"; keep major.minor
    let mut parts = token.splitn(3, '.');
    let major = parts.next()?;
    let version = match parts.next() {
        Some(minor) => format!("{major}.{minor}"),
        None => major.to_string(),
    };
    version.parse().ok()
}
