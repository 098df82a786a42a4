//! Viewer configuration loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable config files.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::rasterizer::{Color, RasterSettings, Vec3, HEIGHT, WIDTH};

/// Error type for config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Everything the viewer needs to show a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: usize,
    pub height: usize,
    /// OBJ file to import
    pub scene: PathBuf,
    /// Uniform scale applied to imported positions
    pub scale: f32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    /// Radians per second around the target's Y axis
    pub orbit_speed: f32,
    pub clear_color: Color,
    pub settings: RasterSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            scene: PathBuf::from("assets/cube.obj"),
            scale: 1.0,
            camera_position: Vec3::new(0.0, 1.0, 5.0),
            camera_target: Vec3::ZERO,
            orbit_speed: 0.3,
            clear_color: Color::BLACK,
            settings: RasterSettings::default(),
        }
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &ViewerConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<ViewerConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}
