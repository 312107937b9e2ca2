use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::backend::Rgba;
use crate::error::ConfigError;

/// Complete viewer configuration, injected into the viewport at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewerConfig {
    /// Build volume dimensions
    #[serde(default)]
    pub volume: PrintVolume,
    /// Redraw and quality settings
    #[serde(default)]
    pub render: RenderConfig,
    /// Light toggles
    #[serde(default)]
    pub lighting: LightingConfig,
    /// Surface colours
    #[serde(default)]
    pub colors: ColorConfig,
}

/// Printable build volume in millimetres, origin at the front-left floor corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintVolume {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_depth")]
    pub depth: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Optional parking area on the bed, drawn with its own outline
    #[serde(default)]
    pub dump_area: Option<DumpArea>,
}

/// Rectangle on the bed floor reserved for purging/parking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DumpArea {
    pub left: f32,
    pub front: f32,
    pub width: f32,
    pub depth: f32,
}

/// Drawing method requested by the user; `Autodetect` defers to the capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMethod {
    #[default]
    Autodetect,
    VertexBuffers,
    DrawElements,
    Immediate,
}

/// Redraw cadence and degradation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub draw_method: DrawMethod,
    /// Draw the build volume outline, grid and base plate (default: true)
    #[serde(default = "default_true")]
    pub show_printbed: bool,
    /// Scheduler tick period in milliseconds (default: 30)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Frames below this rate count as slow (default: 30)
    #[serde(default = "default_min_fps")]
    pub min_fps: f32,
    /// Consecutive slow frames before models reduce quality (default: 10)
    #[serde(default = "default_slow_frame_limit")]
    pub slow_frame_limit: u32,
}

/// Ambient level plus the four fixed directional lights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    #[serde(default = "default_ambient")]
    pub ambient: f32,
    #[serde(default = "default_lights")]
    pub lights: [bool; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_background")]
    pub background: Rgba,
    #[serde(default = "default_printbed")]
    pub printbed: Rgba,
}

fn default_width() -> f32 {
    200.0
}
fn default_depth() -> f32 {
    200.0
}
fn default_height() -> f32 {
    100.0
}

fn default_true() -> bool {
    true
}
fn default_tick_interval() -> u64 {
    30
}
fn default_min_fps() -> f32 {
    30.0
}
fn default_slow_frame_limit() -> u32 {
    10
}

fn default_ambient() -> f32 {
    0.2
}
fn default_lights() -> [bool; 4] {
    [true, false, false, false]
}

fn default_background() -> Rgba {
    Rgba(250, 250, 255, 255)
}
fn default_printbed() -> Rgba {
    Rgba(252, 237, 185, 255)
}

impl Default for PrintVolume {
    fn default() -> Self {
        Self {
            width: default_width(),
            depth: default_depth(),
            height: default_height(),
            dump_area: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            draw_method: DrawMethod::default(),
            show_printbed: default_true(),
            tick_interval_ms: default_tick_interval(),
            min_fps: default_min_fps(),
            slow_frame_limit: default_slow_frame_limit(),
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: default_ambient(),
            lights: default_lights(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            printbed: default_printbed(),
        }
    }
}

impl ViewerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded viewer configuration");
        Ok(config)
    }
}
